// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GitHub identity credential.
//!
//! Registering SSH keys and locating the user's dotfiles repository both need
//! to know who the user is on GitHub. Devboot reads that identity from a tiny
//! plain text file of `key: value` pairs:
//!
//! ```text
//! username: octocat
//! email: octocat@github.com
//! token: ghp_XXXXXXXXXXXXXXXX
//! ```
//!
//! The keys `username`, `email`, and `token` are required. Any other key is
//! ignored. A value wrapped in angle brackets like `<INSERT OWN VALUE>` is a
//! __placeholder__ that the user never filled in, and is rejected.
//!
//! If the file does not exist, devboot writes a placeholder template in its
//! place and refuses to go any further. The user is expected to fill the
//! template in and run devboot again.

use std::{
    collections::HashMap,
    fmt::{Debug, Formatter, Result as FmtResult},
    fs::{read_to_string, write},
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument, warn};

/// Keys every credential file must provide.
pub const REQUIRED_KEYS: [&str; 3] = ["username", "email", "token"];

/// Value written for every key of a generated template.
pub const PLACEHOLDER: &str = "<INSERT OWN VALUE>";

/// GitHub identity of the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    username: String,
    email: String,
    token: String,
}

impl Credential {
    /// Construct new credential.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            token: token.into(),
        }
    }

    /// Load credential from file at target path.
    ///
    /// Generates a placeholder template at target path if it does not exist.
    ///
    /// # Errors
    ///
    /// - Return [`CredentialError::TemplateGenerated`] if the file was
    ///   missing, and a template got written in its place.
    /// - Return [`CredentialError::WriteTemplate`] if the file was missing,
    ///   and the template could not be written.
    /// - Return [`CredentialError::Read`] if the file cannot be read.
    /// - Return any parsing error of [`Credential::from_str`].
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("credential file {:?} does not exist", path.display());
                write_template(path)?;
                return Err(CredentialError::TemplateGenerated {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => {
                return Err(CredentialError::Read {
                    source: err,
                    path: path.to_path_buf(),
                })
            }
        };

        let credential: Credential = content.parse()?;
        debug!("loaded credential: {credential:?}");

        Ok(credential)
    }

    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn token(&self) -> &str {
        self.token.as_str()
    }
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut entries = HashMap::new();
        for (index, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once(':')
                .map(|(key, value)| (key.trim(), value.trim()))
                .ok_or(CredentialError::Malformed { line: index + 1 })?;

            if key.is_empty() {
                return Err(CredentialError::Malformed { line: index + 1 });
            }

            // INVARIANT: Unknown keys are ignored.
            if !REQUIRED_KEYS.contains(&key) {
                continue;
            }

            if entries.insert(key, value).is_some() {
                return Err(CredentialError::DuplicateKey { key: key.into() });
            }
        }

        let required = |key: &str| -> Result<String> {
            let value = entries
                .get(key)
                .ok_or_else(|| CredentialError::MissingKey { key: key.into() })?;

            if value.is_empty() || is_placeholder(value) {
                return Err(CredentialError::Unset { key: key.into() });
            }

            Ok((*value).to_owned())
        };

        Ok(Self::new(
            required("username")?,
            required("email")?,
            required("token")?,
        ))
    }
}

impl Debug for Credential {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("Credential")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Check if value was never filled in by the user.
pub fn is_placeholder(value: &str) -> bool {
    value.starts_with('<') || value.ends_with('>')
}

/// Render placeholder template for credential file.
pub fn template() -> String {
    REQUIRED_KEYS
        .iter()
        .map(|key| format!("{key}: {PLACEHOLDER}\n"))
        .collect()
}

fn write_template(path: &Path) -> Result<()> {
    let write_error = |source| CredentialError::WriteTemplate {
        source,
        path: path.to_path_buf(),
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        mkdirp::mkdirp(parent).map_err(write_error)?;
    }

    write(path, template()).map_err(write_error)
}

/// Credential error types.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Credential file was missing, and a template was generated instead.
    #[error("credential file did not exist, fill in the template generated at {:?}", path.display())]
    TemplateGenerated { path: PathBuf },

    /// Credential template could not be written.
    #[error("failed to write credential template to {:?}", path.display())]
    WriteTemplate {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Credential file could not be read.
    #[error("failed to read credential file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Line is not a `key: value` pair.
    #[error("line {line} of credential file is not a 'key: value' pair")]
    Malformed { line: usize },

    /// Required key is not present.
    #[error("credential key {key:?} is missing")]
    MissingKey { key: String },

    /// Required key is empty or still holds a placeholder.
    #[error("credential key {key:?} is unset or invalid")]
    Unset { key: String },

    /// Required key is declared more than once.
    #[error("credential key {key:?} is declared more than once")]
    DuplicateKey { key: String },
}

/// Friendly result alias :3
type Result<T, E = CredentialError> = std::result::Result<T, E>;
