// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shared state of a devboot run.
//!
//! Everything a run needs to know is built once up front and handed down by
//! reference: the settings, the GitHub credential, the user name, and the
//! [`Syscaller`] every external command goes through. Component handles are
//! derived from it on demand, so swapping the syscaller for a fake swaps it
//! for every component at once.

use crate::{
    config::{PackageLists, Settings},
    credential::{Credential, CredentialError},
    dotfiles::Dotfiles,
    github::{self, GithubClient},
    package::{CliPackageManager, Reconciler},
    path,
    powerline::Powerline,
    ssh::SshKeys,
    syscall::{Syscaller, SystemSyscaller},
};

use tracing::{debug, instrument};

/// Shared state of a devboot run.
#[derive(Debug, Clone)]
pub struct Context<S = SystemSyscaller>
where
    S: Syscaller,
{
    settings: Settings,
    credential: Credential,
    username: String,
    test_mode: bool,
    syscaller: S,
}

impl<S> Context<S>
where
    S: Syscaller,
{
    /// Construct new context.
    pub fn new(settings: Settings, credential: Credential, syscaller: S) -> Self {
        Self {
            settings,
            credential,
            username: path::username(),
            test_mode: false,
            syscaller,
        }
    }

    /// Construct new context, loading credential from the file settings
    /// point at.
    ///
    /// # Errors
    ///
    /// - Return [`CredentialError`] if credential cannot be loaded.
    #[instrument(skip(settings, syscaller), level = "debug")]
    pub fn load(settings: Settings, syscaller: S) -> Result<Self, CredentialError> {
        let credential = Credential::load(&settings.credential_file)?;
        debug!("effective settings:\n{settings}");

        Ok(Self::new(settings, credential, syscaller))
    }

    /// Override user name detected from the system.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Read package wishlists meant for testing.
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    pub fn syscaller(&self) -> &S {
        &self.syscaller
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Package wishlists of current mode.
    pub fn package_lists(&self) -> &PackageLists {
        self.settings.package_lists(self.test_mode)
    }

    pub fn reconciler(&self) -> Reconciler<CliPackageManager<&S>> {
        Reconciler::new(CliPackageManager::new(&self.syscaller))
    }

    pub fn ssh_keys(&self) -> SshKeys<&S> {
        SshKeys::new(&self.settings.ssh.dir, &self.syscaller)
    }

    pub fn powerline(&self) -> Powerline<&S> {
        Powerline::new(&self.settings.powerline.config_dir, &self.syscaller)
    }

    pub fn dotfiles(&self) -> Dotfiles {
        Dotfiles::new(&self.settings.dotfiles.dir)
    }

    /// GitHub client acting as the credential's user.
    ///
    /// # Errors
    ///
    /// - Return [`github::GithubError::Client`] if the client cannot be built.
    pub fn github(&self) -> github::Result<GithubClient> {
        GithubClient::new(self.settings.github.api_url.as_str(), &self.credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageFamily;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::path::Path;

    #[sealed_test]
    fn load_fails_before_anything_else_without_credential() {
        let result = Context::load(Settings::default(), SystemSyscaller);
        assert!(matches!(result, Err(CredentialError::TemplateGenerated { .. })));
        assert!(Path::new("config/git-credentials.txt").is_file());
    }

    #[test]
    fn test_mode_switches_package_lists() {
        let context = Context::new(
            Settings::default(),
            Credential::new("octocat", "octocat@github.com", "ghp_abc"),
            SystemSyscaller,
        )
        .with_username("octocat")
        .with_test_mode(true);

        assert_eq!(context.username(), "octocat");
        assert_eq!(
            context.package_lists().get(PackageFamily::Formula),
            Path::new("config/test/brew-leaves")
        );
    }
}
