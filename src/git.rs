// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote repository access through libgit2.
//!
//! Devboot pulls two repositories from the network: the user's dotfiles, and
//! the patched fonts for powerline. Both are cloned with a progress bar, and
//! authentication goes through [`auth_git2`] so that SSH agents, default SSH
//! keys, and credential helpers all just work.

use auth_git2::{GitAuthenticator, Prompter};
use git2::{build::RepoBuilder, Config, Direction, FetchOptions, Remote, RemoteCallbacks, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    path::Path,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument};

/// URL of repository under a GitHub account, reached over SSH.
pub fn github_url(username: &str, repository: &str) -> String {
    format!("git@github.com:{username}/{repository}.git")
}

/// Check if remote repository can be reached.
///
/// Never prompts. Only the SSH agent and default SSH keys are tried, so an
/// unreachable, private, or missing repository all count as absent.
#[instrument(level = "debug")]
pub fn remote_exists(url: &str) -> bool {
    let probe = || -> Result<()> {
        let authenticator = GitAuthenticator::new_empty()
            .try_ssh_agent(true)
            .add_default_ssh_keys();
        let config = Config::open_default()?;

        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));

        let mut remote = Remote::create_detached(url)?;
        remote.connect_auth(Direction::Fetch, Some(rc), None)?;
        Ok(())
    };

    match probe() {
        Ok(()) => true,
        Err(error) => {
            debug!("remote {url:?} is not reachable: {error}");
            false
        }
    }
}

/// Clone remote repository into path while showing a progress bar.
///
/// # Errors
///
/// - Return [`GitError::Git2`] if libgit2 operations fail.
/// - Return [`GitError::IndicatifStyleTemplate`] if the progress bar cannot
///   be styled.
#[instrument(skip(path), level = "debug")]
pub fn clone_with_progress(url: &str, path: impl AsRef<Path>) -> Result<Repository> {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
    )?
    .progress_chars("-Cco.");
    bar.set_style(style);
    bar.set_message(url.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));

    let prompter = IndicatifPrompter::new(bar);
    let authenticator = GitAuthenticator::default().set_prompter(prompter.clone());
    let config = Config::open_default()?;

    let mut throttle = Instant::now();
    let mut rc = RemoteCallbacks::new();
    rc.credentials(authenticator.credentials(&config));
    rc.transfer_progress(|progress| {
        let stats = progress.to_owned();
        if throttle.elapsed() > Duration::from_millis(10) {
            throttle = Instant::now();
            prompter.bar.set_length(stats.total_objects() as u64);
            prompter.bar.set_position(stats.received_objects() as u64);
        }
        true
    });

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(rc);
    let result = RepoBuilder::new()
        .fetch_options(fo)
        .clone(url, path.as_ref());
    prompter.bar.finish_and_clear();

    let repository = result?;
    info!("cloned {url:?} into {:?}", path.as_ref().display());

    Ok(repository)
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("passphrase")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

/// Git error types.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = GitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn github_url_uses_ssh() {
        assert_eq!(
            github_url("octocat", "dotfiles"),
            "git@github.com:octocat/dotfiles.git"
        );
    }

    #[sealed_test]
    fn clone_local_repository() -> anyhow::Result<()> {
        let source = Repository::init("source")?;
        std::fs::write("source/.vimrc", "set number\n")?;
        let mut index = source.index()?;
        index.add_path(Path::new(".vimrc"))?;
        let tree = source.find_tree(index.write_tree()?)?;
        let signature = git2::Signature::now("octocat", "octocat@github.com")?;
        source.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])?;

        let url = std::env::current_dir()?.join("source");
        let url = url.to_string_lossy();
        assert!(remote_exists(&url));
        assert!(!remote_exists("/no/such/repository"));

        clone_with_progress(&url, "clone")?;
        assert_eq!(std::fs::read_to_string("clone/.vimrc")?, "set number\n");
        Ok(())
    }
}
