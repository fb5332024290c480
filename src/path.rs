// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use crate::syscall::{Syscall, SyscallError, Syscaller};

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`PathError::NoWayHome`] if home directory path cannot be
///   determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(PathError::NoWayHome)
}

/// Determine absolute path to Python's user site-packages directory.
///
/// Asks `python3 -m site --user-site`, so the path reflects whatever Python
/// interpreter is first on `PATH`. Does not check if the path returned
/// actually exists.
///
/// # Errors
///
/// - Return [`PathError::UserSite`] if Python cannot be asked.
/// - Return [`PathError::EmptyUserSite`] if Python reported nothing.
pub fn python_user_site(syscaller: &impl Syscaller) -> Result<PathBuf> {
    let output = syscaller
        .call_checked(&Syscall::new("python3").args(["-m", "site", "--user-site"]))
        .map_err(PathError::UserSite)?;

    let site = output.stdout.trim();
    if site.is_empty() {
        return Err(PathError::EmptyUserSite);
    }

    Ok(PathBuf::from(site))
}

/// Determine name of the user running devboot.
pub fn username() -> String {
    whoami::username()
}

/// Path resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// No way to determine user's home directory.
    ///
    /// # See Also
    ///
    /// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
    #[error("cannot determine absolute path to user's home directory")]
    NoWayHome,

    /// Python could not report its user site directory.
    #[error("cannot determine python user site directory")]
    UserSite(#[source] SyscallError),

    /// Python reported an empty user site directory.
    #[error("python reported an empty user site directory")]
    EmptyUserSite,
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;
