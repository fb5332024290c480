// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfiles repository management.
//!
//! Users may keep a `dotfiles` repository on their GitHub account. Devboot
//! clones it once, then copies the few user files it knows about into place.
//! The repository is optional, so a missing repository or a missing file in
//! it is reported but never treated as fatal.

use crate::git::{self, GitError};

use std::{
    fs::{copy, remove_dir_all, remove_file},
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

/// Result of cloning the dotfiles repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    AlreadyCloned,
    Cloned,
}

/// Local clone of the dotfiles repository.
#[derive(Debug, Clone)]
pub struct Dotfiles {
    dir: PathBuf,
}

impl Dotfiles {
    /// Construct new handle for clone at target directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    pub fn is_cloned(&self) -> bool {
        self.dir.exists()
    }

    /// Clone repository unless a clone already exists.
    ///
    /// # Errors
    ///
    /// - Return [`DotfilesError::Git`] if cloning fails.
    #[instrument(skip(self), level = "debug")]
    pub fn pull(&self, url: &str) -> Result<CloneOutcome> {
        if self.is_cloned() {
            info!("dotfile settings already pulled from git");
            return Ok(CloneOutcome::AlreadyCloned);
        }

        git::clone_with_progress(url, &self.dir)?;
        info!("dotfile settings has successfully been cloned from github");

        Ok(CloneOutcome::Cloned)
    }

    /// Copy file of repository to target path.
    ///
    /// Parent directories of target are created as needed. Existing target
    /// is overwritten.
    ///
    /// # Errors
    ///
    /// - Return [`DotfilesError::MissingInRepository`] if repository does not
    ///   provide the file.
    /// - Return [`DotfilesError::Install`] if the file cannot be copied.
    #[instrument(skip(self, name, target), level = "debug")]
    pub fn install_file(&self, name: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<()> {
        let source = self.dir.join(name.as_ref());
        let target = target.as_ref();
        if !source.is_file() {
            return Err(DotfilesError::MissingInRepository {
                name: name.as_ref().to_path_buf(),
            });
        }

        let install_error = |source| DotfilesError::Install {
            source,
            path: target.to_path_buf(),
        };

        if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent).map_err(install_error)?;
        }
        copy(&source, target).map_err(install_error)?;
        info!(
            "{:?} now configured from the dotfiles repository",
            target.display()
        );

        Ok(())
    }

    /// Delete local clone.
    ///
    /// Returns `false` if there was no clone to delete.
    ///
    /// # Errors
    ///
    /// - Return [`DotfilesError::Remove`] if the clone cannot be deleted.
    #[instrument(skip(self), level = "debug")]
    pub fn remove_repository(&self) -> Result<bool> {
        if !self.is_cloned() {
            info!("dotfile settings has been already removed");
            return Ok(false);
        }

        remove_dir_all(&self.dir).map_err(|source| DotfilesError::Remove {
            source,
            path: self.dir.clone(),
        })?;
        info!("dotfiles repository cloned from github has successfully been removed");

        Ok(true)
    }
}

/// Delete user file installed from the repository.
///
/// Returns `false` if there was no file to delete.
///
/// # Errors
///
/// - Return [`DotfilesError::Remove`] if the file cannot be deleted.
pub fn remove_user_file(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if !path.exists() {
        info!("{:?} has been already removed", path.display());
        return Ok(false);
    }

    remove_file(path).map_err(|source| DotfilesError::Remove {
        source,
        path: path.to_path_buf(),
    })?;
    info!("{:?} has successfully been removed", path.display());

    Ok(true)
}

/// Dotfiles error types.
#[derive(Debug, thiserror::Error)]
pub enum DotfilesError {
    /// Repository does not provide requested file.
    #[error("missing {:?} in the dotfiles repository", name.display())]
    MissingInRepository { name: PathBuf },

    /// File could not be copied into place.
    #[error("failed to install {:?}", path.display())]
    Install {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File or directory could not be deleted.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Friendly result alias :3
pub type Result<T, E = DotfilesError> = std::result::Result<T, E>;
