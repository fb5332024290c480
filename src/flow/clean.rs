// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Teardown flow.
//!
//! Undo what the bootstrap flow did, roughly in reverse. Formulae and casks
//! are left installed, since other software on the machine may depend on
//! them. Every step tolerates things already being gone.

use crate::{
    context::Context,
    dotfiles,
    flow::{Result, Steps},
    github::find_key,
    package::{list_desired, PackageFamily, PackageSet, Uninstallation},
    ssh,
    syscall::Syscaller,
};

use tracing::{info, instrument, warn};

/// Options of the teardown flow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    /// Uninstall every runtime package, not just the wishlisted ones.
    pub all_runtime_packages: bool,
}

/// Run every teardown step after the credential got loaded.
///
/// # Errors
///
/// - Return [`FlowError`](crate::flow::FlowError) on the first fatal error of
///   any step.
pub async fn run<S>(context: &Context<S>, steps: &mut Steps, options: CleanOptions) -> Result<()>
where
    S: Syscaller,
{
    steps.begin("Uninstalling PIP packages...");
    uninstall_runtime_packages(context, options)?;

    steps.begin("Uninstalling powerline...");
    remove_powerline(context)?;

    steps.begin("Uninstalling dotfiles...");
    remove_dotfiles(context)?;

    steps.begin("Uninstalling Git SSH...");
    remove_git_ssh(context).await?;

    Ok(())
}

/// Uninstall wishlisted runtime packages along with powerline's own.
///
/// # Errors
///
/// - Return [`FlowError::Package`](crate::flow::FlowError::Package) if the
///   wishlist cannot be read, or installed packages cannot be listed.
#[instrument(skip(context), level = "debug")]
pub fn uninstall_runtime_packages<S>(
    context: &Context<S>,
    options: CleanOptions,
) -> Result<Uninstallation>
where
    S: Syscaller,
{
    let reconciler = context.reconciler();
    if options.all_runtime_packages {
        return Ok(reconciler.uninstall_all(PackageFamily::Runtime, None)?);
    }

    let allowed = runtime_allow_list(context)?;
    Ok(reconciler.uninstall_all(PackageFamily::Runtime, Some(&allowed))?)
}

/// Unhook powerline from user files, and delete its configuration.
///
/// # Errors
///
/// - Return [`FlowError::Powerline`](crate::flow::FlowError::Powerline) if
///   any step fails.
#[instrument(skip(context), level = "debug")]
pub fn remove_powerline<S>(context: &Context<S>) -> Result<()>
where
    S: Syscaller,
{
    let settings = &context.settings().dotfiles;
    let powerline = context.powerline();
    powerline.remove_bash(&settings.bash_profile)?;
    powerline.remove_vim(&settings.vimrc)?;
    powerline.uninstall_fonts()?;
    powerline.remove_config_dir()?;

    Ok(())
}

/// Delete dotfiles clone and the user files installed from it.
///
/// # Errors
///
/// - Return [`FlowError::Dotfiles`](crate::flow::FlowError::Dotfiles) if
///   anything cannot be deleted.
#[instrument(skip(context), level = "debug")]
pub fn remove_dotfiles<S>(context: &Context<S>) -> Result<()>
where
    S: Syscaller,
{
    let settings = &context.settings().dotfiles;
    context.dotfiles().remove_repository()?;
    for path in [&settings.bash_profile, &settings.vimrc, &settings.emacs_init] {
        dotfiles::remove_user_file(path)?;
    }

    Ok(())
}

/// Unregister key from GitHub, delete keypair, and undo SSH configuration.
///
/// # Errors
///
/// - Return [`FlowError::Github`](crate::flow::FlowError::Github) if GitHub
///   cannot be talked to.
/// - Return [`FlowError::Ssh`](crate::flow::FlowError::Ssh) if any SSH
///   operation fails.
#[instrument(skip(context), level = "debug")]
pub async fn remove_git_ssh<S>(context: &Context<S>) -> Result<()>
where
    S: Syscaller,
{
    let keys = context.ssh_keys();
    if keys.exists() {
        let local = keys.public_key()?;
        let client = context.github()?;
        let remote = client.list_keys().await?;
        match find_key(&remote, &local) {
            Some(key) => client.delete_key(key.id).await?,
            None => warn!("public key does not exist on github"),
        }
    }

    keys.delete()?;
    ssh::stop_agent(context.syscaller(), context.username())?;
    keys.remove_identity()?;
    keys.untrust_github()?;
    info!("git SSH has been unconfigured");

    Ok(())
}

/// Runtime packages a teardown is allowed to uninstall.
///
/// # Errors
///
/// - Return [`FlowError::Package`](crate::flow::FlowError::Package) if the
///   wishlist cannot be read.
pub fn runtime_allow_list<S>(context: &Context<S>) -> Result<PackageSet>
where
    S: Syscaller,
{
    let mut allowed = list_desired(context.package_lists().get(PackageFamily::Runtime))?;
    allowed.extend(context.settings().powerline.runtime_packages.iter().cloned());
    Ok(allowed)
}
