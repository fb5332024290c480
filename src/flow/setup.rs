// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap flow.
//!
//! Packages come first, because everything after them leans on tools they
//! provide. Then SSH keys, so that GitHub can be talked to over SSH, then
//! dotfiles, and finally powerline, which patches the user files the
//! dotfiles step may have just put in place.

use crate::{
    context::Context,
    dotfiles::DotfilesError,
    flow::{FlowError, Result, Steps},
    git,
    github::find_key,
    package::{PackageFamily, PackageSet, Reconciliation},
    path,
    ssh,
    syscall::Syscaller,
};

use std::path::Path;
use tracing::{info, instrument, warn};

/// Package families in the order they get reconciled.
pub const FAMILIES: [PackageFamily; 3] =
    [PackageFamily::Formula, PackageFamily::Cask, PackageFamily::Runtime];

/// What a bootstrap did to the package sets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub packages: Vec<(PackageFamily, Reconciliation)>,
}

/// Run every bootstrap step after the credential got loaded.
///
/// The passphrase prompt is only invoked when a new SSH key is generated.
///
/// # Errors
///
/// - Return [`FlowError`] on the first fatal error of any step.
pub async fn run<S, P>(context: &Context<S>, steps: &mut Steps, passphrase: P) -> Result<SetupReport>
where
    S: Syscaller,
    P: FnOnce() -> Option<String>,
{
    steps.begin("Installing packages...");
    let packages = install_packages(context)?;

    steps.begin("Configuring SSH keys...");
    configure_ssh(context, passphrase)?;

    steps.begin("Configuring Github SSH connection...");
    register_github_key(context).await?;

    steps.begin("Configuring dotfiles from GitHub...");
    configure_dotfiles(context)?;

    steps.begin("Configuring powerline for terminal...");
    configure_powerline(context)?;

    Ok(SetupReport { packages })
}

/// Reconcile every package family against its wishlist.
///
/// # Errors
///
/// - Return [`FlowError::Package`] if a wishlist cannot be read, or
///   installed packages cannot be listed.
pub fn install_packages<S>(context: &Context<S>) -> Result<Vec<(PackageFamily, Reconciliation)>>
where
    S: Syscaller,
{
    let reconciler = context.reconciler();
    let lists = context.package_lists();

    FAMILIES
        .into_iter()
        .map(|family| -> Result<(PackageFamily, Reconciliation)> {
            info!("reconciling {family} packages from {:?}", lists.get(family).display());
            let reconciliation = reconciler.reconcile(family, lists.get(family))?;
            Ok((family, reconciliation))
        })
        .collect()
}

/// Generate SSH keypair unless present, and trust GitHub's host key.
///
/// # Errors
///
/// - Return [`FlowError::NoPassphrase`] if passphrase prompt gave nothing.
/// - Return [`FlowError::Ssh`] if any SSH operation fails.
#[instrument(skip(context, passphrase), level = "debug")]
pub fn configure_ssh<S, P>(context: &Context<S>, passphrase: P) -> Result<()>
where
    S: Syscaller,
    P: FnOnce() -> Option<String>,
{
    let keys = context.ssh_keys();
    if !keys.exists() {
        let passphrase = passphrase().ok_or(FlowError::NoPassphrase)?;
        keys.generate(context.credential().email(), &passphrase)?;
        ssh::start_agent(context.syscaller(), context.username())?;
        keys.configure_identity()?;
        keys.add_to_agent()?;
    }

    keys.trust_github()?;

    Ok(())
}

/// Register local public key on GitHub unless already registered.
///
/// # Errors
///
/// - Return [`FlowError::Ssh`] if local public key cannot be read.
/// - Return [`FlowError::Github`] if GitHub cannot be talked to.
#[instrument(skip(context), level = "debug")]
pub async fn register_github_key<S>(context: &Context<S>) -> Result<()>
where
    S: Syscaller,
{
    let local = context.ssh_keys().public_key()?;
    let client = context.github()?;
    let remote = client.list_keys().await?;

    if find_key(&remote, &local).is_some() {
        info!("git SSH has already been configured on github");
        return Ok(());
    }

    client
        .create_key(context.settings().github.key_title.as_str(), &local)
        .await?;

    Ok(())
}

/// Clone dotfiles repository and install user files from it.
///
/// The whole step is skipped when the user has no dotfiles repository.
///
/// # Errors
///
/// - Return [`FlowError::Dotfiles`] if cloning or copying fails.
#[instrument(skip(context), level = "debug")]
pub fn configure_dotfiles<S>(context: &Context<S>) -> Result<()>
where
    S: Syscaller,
{
    let settings = &context.settings().dotfiles;
    let dotfiles = context.dotfiles();
    let url = git::github_url(context.credential().username(), &settings.repository);

    if !dotfiles.is_cloned() && !git::remote_exists(&url) {
        info!("skipping dotfiles, this step is optional but it requires {url:?}");
        return Ok(());
    }
    dotfiles.pull(&url)?;

    let mut files = vec![
        (Path::new(".vimrc"), settings.vimrc.as_path()),
        (Path::new(".bash_profile"), settings.bash_profile.as_path()),
    ];

    if settings.emacs_dir.is_dir() {
        files.push((Path::new("init.el"), settings.emacs_init.as_path()));
    } else {
        info!("missing emacs application in the user level config");
    }

    for (name, target) in files {
        match dotfiles.install_file(name, target) {
            Err(error @ DotfilesError::MissingInRepository { .. }) => warn!("{error}"),
            result => result?,
        }
    }

    Ok(())
}

/// Install and configure powerline.
///
/// # Errors
///
/// - Return [`FlowError::RequiredPackages`] if powerline cannot be
///   installed.
/// - Return [`FlowError::Path`] if Python's user site cannot be found.
/// - Return [`FlowError::Powerline`] if any configuration step fails.
#[instrument(skip(context), level = "debug")]
pub fn configure_powerline<S>(context: &Context<S>) -> Result<()>
where
    S: Syscaller,
{
    let settings = context.settings();
    let wanted = settings
        .powerline
        .runtime_packages
        .iter()
        .cloned()
        .collect::<PackageSet>();
    let reconciliation = context.reconciler().ensure(PackageFamily::Runtime, wanted)?;
    if !reconciliation.failed.is_empty() {
        return Err(FlowError::RequiredPackages {
            packages: reconciliation.failed.into_iter().collect(),
        });
    }

    let site = path::python_user_site(context.syscaller())?;
    let powerline = context.powerline();
    powerline.copy_default_config(&site)?;
    powerline.install_fonts(&settings.powerline.fonts_repository)?;
    powerline.configure_git_colorscheme(&settings.powerline.colorscheme_overlay)?;
    powerline.configure_git_shell(&settings.powerline.shell_segment)?;
    powerline.configure_bash(&settings.dotfiles.bash_profile, &site)?;
    powerline.configure_vim(&settings.dotfiles.vimrc, &site)?;

    Ok(())
}
