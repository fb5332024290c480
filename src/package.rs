// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package set reconciliation.
//!
//! The user keeps a plain text __wishlist__ for each package family: one
//! package name per line, blank lines ignored. Reconciliation diffs that
//! wishlist against whatever the package manager reports as installed, and
//! installs the difference.
//!
//! # Package Families
//!
//! A __family__ is a package manager category with its own commands for
//! listing, querying, installing, and uninstalling packages:
//!
//! - __Formula__: Homebrew formulae (`brew install <name>`).
//! - __Cask__: Homebrew casks, i.e., applications (`brew install --cask`).
//! - __Runtime__: Python packages installed at the user level through pip.
//!
//! # Failure Semantics
//!
//! Knowing the installed set is mandatory, so failing to list installed
//! packages aborts reconciliation. Installing a single package, on the other
//! hand, is best effort. A package that is missing from the registry or that
//! fails to install is recorded as failed, and the remaining packages are
//! still attempted.

use crate::syscall::{Syscall, SyscallError, Syscaller, SystemSyscaller};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Set of package names that remembers insertion order.
pub type PackageSet = IndexSet<String>;

/// Package manager category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PackageFamily {
    Formula,
    Cask,
    Runtime,
}

impl PackageFamily {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Formula => "formula",
            Self::Cask => "cask",
            Self::Runtime => "runtime",
        }
    }

    /// Command listing every installed package.
    pub fn list_syscall(&self) -> Syscall {
        match self {
            Self::Formula => Syscall::new("brew").args(["list", "--formula", "-1"]),
            Self::Cask => Syscall::new("brew").args(["list", "--cask", "-1"]),
            Self::Runtime => {
                Syscall::new("pip3").args(["list", "--user", "--format=freeze"])
            }
        }
    }

    /// Command checking that a package exists in the registry.
    pub fn info_syscall(&self, package: &str) -> Syscall {
        match self {
            Self::Formula => Syscall::new("brew").args(["info", "--formula", package]),
            Self::Cask => Syscall::new("brew").args(["info", "--cask", package]),
            Self::Runtime => Syscall::new("pip3").args(["index", "versions", package]),
        }
    }

    /// Command installing one package.
    pub fn install_syscall(&self, package: &str) -> Syscall {
        match self {
            Self::Formula => Syscall::new("brew").args(["install", "--formula", package]),
            Self::Cask => Syscall::new("brew").args(["install", "--cask", package]),
            Self::Runtime => Syscall::new("pip3").args(["install", "--user", package]),
        }
    }

    /// Command uninstalling a listing of packages in bulk.
    pub fn uninstall_syscall(&self, packages: impl IntoIterator<Item = impl AsRef<str>>) -> Syscall {
        let syscall = match self {
            Self::Formula => Syscall::new("brew").args(["uninstall", "--formula"]),
            Self::Cask => Syscall::new("brew").args(["uninstall", "--cask"]),
            Self::Runtime => Syscall::new("pip3").args(["uninstall", "-y"]),
        };

        syscall.args(packages.into_iter().map(|package| package.as_ref().to_owned()))
    }

    /// Parse output of the listing command into package names.
    pub fn parse_listing(&self, output: &str) -> PackageSet {
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match self {
                // INVARIANT: pip freeze format is `name==version`.
                Self::Runtime => line.split("==").next().unwrap_or(line).trim().to_owned(),
                Self::Formula | Self::Cask => line.to_owned(),
            })
            .collect()
    }
}

impl Display for PackageFamily {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.name())
    }
}

/// Layer of indirection for package manager access.
pub trait PackageManager {
    /// List every installed package of family.
    fn list_installed(&self, family: PackageFamily) -> Result<PackageSet>;

    /// Check if package exists in registry of family.
    fn exists(&self, family: PackageFamily, package: &str) -> Result<bool>;

    /// Install one package of family.
    fn install(&self, family: PackageFamily, package: &str) -> Result<()>;

    /// Uninstall listing of packages of family in one go.
    fn uninstall(&self, family: PackageFamily, packages: &PackageSet) -> Result<()>;
}

/// Package manager access through command line tools.
#[derive(Debug, Default, Clone)]
pub struct CliPackageManager<S = SystemSyscaller>
where
    S: Syscaller,
{
    syscaller: S,
}

impl<S> CliPackageManager<S>
where
    S: Syscaller,
{
    /// Construct new command line package manager.
    pub fn new(syscaller: S) -> Self {
        Self { syscaller }
    }
}

impl<S> PackageManager for CliPackageManager<S>
where
    S: Syscaller,
{
    fn list_installed(&self, family: PackageFamily) -> Result<PackageSet> {
        let output = self
            .syscaller
            .call_checked(&family.list_syscall())
            .map_err(|source| PackageError::List { source, family })?;

        Ok(family.parse_listing(&output.stdout))
    }

    fn exists(&self, family: PackageFamily, package: &str) -> Result<bool> {
        let output = self
            .syscaller
            .call(&family.info_syscall(package))
            .map_err(|source| PackageError::Query {
                source,
                package: package.into(),
            })?;

        Ok(output.success())
    }

    fn install(&self, family: PackageFamily, package: &str) -> Result<()> {
        let output = self
            .syscaller
            .call(&family.install_syscall(package))
            .map_err(|source| PackageError::Query {
                source,
                package: package.into(),
            })?;

        // INVARIANT: Any stderr output counts as a failed install.
        if !output.success() || !output.stderr.trim().is_empty() {
            return Err(PackageError::Install {
                package: package.into(),
                message: output.message(),
            });
        }

        debug!("{}", output.message());
        Ok(())
    }

    fn uninstall(&self, family: PackageFamily, packages: &PackageSet) -> Result<()> {
        let output = self
            .syscaller
            .call_checked(&family.uninstall_syscall(packages))
            .map_err(|source| PackageError::Uninstall { source, family })?;

        debug!("{}", output.message());
        Ok(())
    }
}

/// Read wishlist of packages from file.
///
/// One package name per line. Surrounding whitespace is trimmed, blank lines
/// are skipped, and file order is preserved.
///
/// # Errors
///
/// - Return [`PackageError::ReadWishlist`] if the file cannot be read.
pub fn list_desired(path: impl AsRef<Path>) -> Result<PackageSet> {
    let content = read_to_string(path.as_ref()).map_err(|err| PackageError::ReadWishlist {
        source: err,
        path: path.as_ref().to_path_buf(),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect())
}

/// Result of reconciling one package family.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub already_installed: PackageSet,
    pub newly_installed: PackageSet,
    pub failed: PackageSet,
}

/// Result of a bulk uninstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uninstallation {
    /// Nothing matched, so no command was issued.
    NothingInstalled,

    /// Every listed package got uninstalled.
    Removed(PackageSet),

    /// Uninstall command failed for listed packages.
    Failed(PackageSet),
}

/// Reconcile wishlists against installed packages.
#[derive(Debug, Default, Clone)]
pub struct Reconciler<P = CliPackageManager>
where
    P: PackageManager,
{
    manager: P,
}

impl<P> Reconciler<P>
where
    P: PackageManager,
{
    /// Construct new reconciler.
    pub fn new(manager: P) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &P {
        &self.manager
    }

    /// List every installed package of family.
    ///
    /// # Errors
    ///
    /// - Return [`PackageError::List`] if the listing command fails.
    pub fn list_installed(&self, family: PackageFamily) -> Result<PackageSet> {
        self.manager.list_installed(family)
    }

    /// Install every package in wishlist file that is not installed yet.
    ///
    /// Packages are attempted in wishlist order. Individual install failures
    /// are logged, and recorded in [`Reconciliation::failed`].
    ///
    /// # Errors
    ///
    /// - Return [`PackageError::ReadWishlist`] if wishlist cannot be read.
    /// - Return [`PackageError::List`] if installed packages cannot be listed.
    /// - Return [`PackageError::Query`] if package manager cannot be queried.
    #[instrument(skip(self, wishlist), level = "debug")]
    pub fn reconcile(
        &self,
        family: PackageFamily,
        wishlist: impl AsRef<Path>,
    ) -> Result<Reconciliation> {
        let desired = list_desired(wishlist.as_ref())?;
        self.ensure(family, desired)
    }

    /// Install every package of desired set that is not installed yet.
    ///
    /// Same as [`Reconciler::reconcile`], minus the wishlist file.
    ///
    /// # Errors
    ///
    /// - Return [`PackageError::List`] if installed packages cannot be listed.
    /// - Return [`PackageError::Query`] if package manager cannot be queried.
    #[instrument(skip(self, desired), level = "debug")]
    pub fn ensure(&self, family: PackageFamily, desired: PackageSet) -> Result<Reconciliation> {
        let installed = self.manager.list_installed(family)?;

        let (already_installed, missing): (PackageSet, PackageSet) = desired
            .into_iter()
            .partition(|package| installed.contains(package));

        for package in &already_installed {
            info!("{package} - already installed");
        }

        let mut reconciliation = Reconciliation {
            already_installed,
            ..Default::default()
        };

        if missing.is_empty() {
            info!("no {family} packages to install");
            return Ok(reconciliation);
        }

        for package in missing {
            match self.manager.exists(family, &package) {
                Ok(true) => {}
                Ok(false) => {
                    warn!("{package} - does not exist in {family} registry");
                    reconciliation.failed.insert(package);
                    continue;
                }
                Err(error) => return Err(error),
            }

            match self.manager.install(family, &package) {
                Ok(()) => {
                    info!("{package} - successfully installed");
                    reconciliation.newly_installed.insert(package);
                }
                Err(error) => {
                    warn!("{error}");
                    warn!("{package} - issue during installation");
                    reconciliation.failed.insert(package);
                }
            }
        }

        if reconciliation.failed.is_empty() {
            info!("all configured {family} packages are now installed");
        } else {
            warn!(
                "{} {family} package(s) failed to install: {:?}",
                reconciliation.failed.len(),
                reconciliation.failed
            );
        }

        Ok(reconciliation)
    }

    /// Uninstall installed packages of family in bulk.
    ///
    /// Only packages in the allow-list are uninstalled when one is given.
    /// Failure of the uninstall command itself is logged, not returned.
    ///
    /// # Errors
    ///
    /// - Return [`PackageError::List`] if installed packages cannot be listed.
    #[instrument(skip(self, allow_list), level = "debug")]
    pub fn uninstall_all(
        &self,
        family: PackageFamily,
        allow_list: Option<&PackageSet>,
    ) -> Result<Uninstallation> {
        let installed = self.manager.list_installed(family)?;
        let targets = match allow_list {
            Some(allowed) => installed
                .into_iter()
                .filter(|package| allowed.contains(package))
                .collect::<PackageSet>(),
            None => installed,
        };

        if targets.is_empty() {
            info!("no {family} packages to uninstall");
            return Ok(Uninstallation::NothingInstalled);
        }

        match self.manager.uninstall(family, &targets) {
            Ok(()) => {
                info!("uninstalled {} {family} package(s)", targets.len());
                Ok(Uninstallation::Removed(targets))
            }
            Err(error) => {
                warn!("{error}");
                warn!("failed to uninstall {family} packages");
                Ok(Uninstallation::Failed(targets))
            }
        }
    }
}

/// Package management error types.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// Wishlist file cannot be read.
    #[error("failed to read package wishlist at {:?}", path.display())]
    ReadWishlist {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Installed packages cannot be listed.
    #[error("failed to list installed {family} packages")]
    List {
        #[source]
        source: SyscallError,
        family: PackageFamily,
    },

    /// Package manager could not be queried about a package.
    #[error("failed to query package manager about {package:?}")]
    Query {
        #[source]
        source: SyscallError,
        package: String,
    },

    /// Package failed to install.
    #[error("failed to install {package:?}:\n{message}")]
    Install { package: String, message: String },

    /// Bulk uninstall failed.
    #[error("failed to uninstall {family} packages")]
    Uninstall {
        #[source]
        source: SyscallError,
        family: PackageFamily,
    },
}

/// Friendly result alias :3
pub type Result<T, E = PackageError> = std::result::Result<T, E>;
