// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GitHub SSH key registration.
//!
//! Thin client over the three REST endpoints devboot needs: listing the
//! public keys of a user, registering a new key, and deleting a key. Listing
//! goes through the public endpoint of the user, while creation and
//! deletion act on the authenticated user through the credential token.

use crate::credential::Credential;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Request timeout for every API call.
pub const TIMEOUT: Duration = Duration::from_secs(3);

/// Public SSH key registered on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublicKey {
    pub id: u64,
    pub key: String,

    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewKey<'a> {
    title: &'a str,
    key: &'a str,
}

/// GitHub REST API client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
    username: String,
    token: String,
}

impl GithubClient {
    /// Construct new client for user of credential.
    ///
    /// # Errors
    ///
    /// - Return [`GithubError::Client`] if HTTP client cannot be built.
    pub fn new(api_url: impl Into<String>, credential: &Credential) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("devboot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GithubError::Client)?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            username: credential.username().to_owned(),
            token: credential.token().to_owned(),
        })
    }

    /// List public keys of user.
    ///
    /// # Errors
    ///
    /// - Return [`GithubError::Request`] if request fails.
    /// - Return [`GithubError::Status`] if GitHub rejects request.
    #[instrument(skip(self), level = "debug")]
    pub async fn list_keys(&self) -> Result<Vec<PublicKey>> {
        let url = format!("{}/users/{}/keys", self.api_url, self.username);
        let response = self.client.get(&url).send().await.map_err(|source| {
            GithubError::Request {
                source,
                url: url.clone(),
            }
        })?;

        let keys = check(response, &url)
            .await?
            .json::<Vec<PublicKey>>()
            .await
            .map_err(|source| GithubError::Request { source, url })?;
        debug!("found {} public key(s) on github", keys.len());

        Ok(keys)
    }

    /// Register public key under title.
    ///
    /// # Errors
    ///
    /// - Return [`GithubError::Request`] if request fails.
    /// - Return [`GithubError::Status`] if GitHub rejects request.
    #[instrument(skip(self, key), level = "debug")]
    pub async fn create_key(&self, title: &str, key: &str) -> Result<PublicKey> {
        let url = format!("{}/user/keys", self.api_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("token {}", self.token))
            .json(&NewKey { title, key })
            .send()
            .await
            .map_err(|source| GithubError::Request {
                source,
                url: url.clone(),
            })?;

        let created = check(response, &url)
            .await?
            .json::<PublicKey>()
            .await
            .map_err(|source| GithubError::Request { source, url })?;
        info!("public key registered on github as {title:?}");

        Ok(created)
    }

    /// Delete public key by identifier.
    ///
    /// # Errors
    ///
    /// - Return [`GithubError::Request`] if request fails.
    /// - Return [`GithubError::Status`] if GitHub rejects request.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_key(&self, id: u64) -> Result<()> {
        let url = format!("{}/user/keys/{id}", self.api_url);
        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("token {}", self.token))
            .send()
            .await
            .map_err(|source| GithubError::Request {
                source,
                url: url.clone(),
            })?;

        check(response, &url).await?;
        info!("public key deleted from github");

        Ok(())
    }
}

async fn check(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GithubError::Status {
        status: status.as_u16(),
        url: url.to_owned(),
        body,
    })
}

/// Find registered key equal to local public key.
///
/// Keys are compared by their `type data` fields only, so comments attached
/// to either side do not matter. Prefixes never match.
pub fn find_key<'k>(keys: &'k [PublicKey], local: &str) -> Option<&'k PublicKey> {
    let local = key_fields(local)?;
    keys.iter()
        .find(|remote| key_fields(&remote.key).is_some_and(|fields| fields == local))
}

fn key_fields(key: &str) -> Option<(&str, &str)> {
    let mut fields = key.split_whitespace();
    Some((fields.next()?, fields.next()?))
}

/// GitHub API error types.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Request could not be completed.
    #[error("failed request to github at {url:?}")]
    Request {
        #[source]
        source: reqwest::Error,
        url: String,
    },

    /// GitHub answered with an unsuccessful status.
    #[error("github answered {status} for {url:?}: {body}")]
    Status { status: u16, url: String, body: String },
}

/// Friendly result alias :3
pub type Result<T, E = GithubError> = std::result::Result<T, E>;
