// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! End to end bootstrap and teardown flows.
//!
//! A flow is a fixed sequence of steps, each announced with a numbered
//! header. The first fatal error aborts the flow on the spot, and nothing
//! already done is rolled back. Running the teardown flow is the way to undo
//! a partial bootstrap.

pub mod clean;
pub mod setup;

use crate::{
    config::ConfigError, credential::CredentialError, dotfiles::DotfilesError,
    github::GithubError, package::PackageError, patch, path::PathError,
    powerline::PowerlineError, ssh::SshError,
};

use tracing::info;

/// Numbered step announcer.
#[derive(Debug, Clone)]
pub struct Steps {
    next: usize,
}

impl Steps {
    /// Construct new step announcer starting at one.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Announce next step.
    pub fn begin(&mut self, title: &str) {
        let header = step_header(self.next, title);
        for line in header.lines() {
            info!("{line}");
        }
        self.next += 1;
    }
}

impl Default for Steps {
    fn default() -> Self {
        Self::new()
    }
}

/// Render boxed header of a step.
pub fn step_header(number: usize, title: &str) -> String {
    let label = format!("| {number}. {title} |");
    let bar = format!("+{}+", "-".repeat(label.chars().count() - 2));
    format!("{bar}\n{label}\n{bar}")
}

/// Flow error types.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// No passphrase was given for a new SSH key.
    #[error("no passphrase given for new SSH key")]
    NoPassphrase,

    /// Packages needed by a later step failed to install.
    #[error("required packages failed to install: {packages:?}")]
    RequiredPackages { packages: Vec<String> },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Ssh(#[from] SshError),

    #[error(transparent)]
    Github(#[from] GithubError),

    #[error(transparent)]
    Dotfiles(#[from] DotfilesError),

    #[error(transparent)]
    Powerline(#[from] PowerlineError),

    #[error(transparent)]
    Patch(#[from] patch::Error),
}

/// Friendly result alias :3
pub type Result<T, E = FlowError> = std::result::Result<T, E>;
