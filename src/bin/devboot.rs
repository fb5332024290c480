// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use devboot::{
    config::{Settings, DEFAULT_SETTINGS_FILE},
    context::Context,
    flow::{
        clean::{self, CleanOptions},
        setup, Steps,
    },
    logging::{self, LogGuards},
    package::{list_desired, CliPackageManager, PackageFamily, Reconciler},
    syscall::SystemSyscaller,
};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use std::{path::PathBuf, process::exit, time::Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "devboot [options] <devboot-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to settings file.
    #[arg(short, long, global = true, value_name = "path", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self, settings: Settings) -> Result<()> {
        match self.command {
            Command::Setup(opts) => run_setup(settings, opts).await,
            Command::Clean(opts) => run_clean(settings, opts).await,
            Command::Reconcile(opts) => run_reconcile(settings, opts),
            Command::Uninstall(opts) => run_uninstall(settings, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Bootstrap development environment.
    #[command(override_usage = "devboot setup [options]")]
    Setup(SetupOptions),

    /// Tear down what setup configured.
    #[command(override_usage = "devboot clean [options]")]
    Clean(CleanOpts),

    /// Install missing packages of one family from its wishlist.
    #[command(override_usage = "devboot reconcile [options] <family>")]
    Reconcile(ReconcileOptions),

    /// Uninstall packages of one family in bulk.
    #[command(override_usage = "devboot uninstall [options] <family>")]
    Uninstall(UninstallOptions),
}

impl Command {
    /// Name of log directory for this command.
    fn name(&self) -> &'static str {
        match self {
            Self::Setup(_) => "setup",
            Self::Clean(_) => "clean",
            Self::Reconcile(_) => "reconcile",
            Self::Uninstall(_) => "uninstall",
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SetupOptions {
    /// Read package wishlists meant for testing.
    #[arg(short, long)]
    pub test: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CleanOpts {
    /// Uninstall every runtime package, not just wishlisted ones.
    #[arg(short, long)]
    pub all_runtime_packages: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReconcileOptions {
    /// Package family to reconcile.
    #[arg(required = true, value_enum, value_name = "family")]
    pub family: PackageFamily,

    /// Read package wishlist meant for testing.
    #[arg(short, long, conflicts_with = "file")]
    pub test: bool,

    /// Read package wishlist from this file instead.
    #[arg(short, long, value_name = "path")]
    pub file: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UninstallOptions {
    /// Package family to uninstall from.
    #[arg(required = true, value_enum, value_name = "family")]
    pub family: PackageFamily,

    /// Uninstall every installed package, not just wishlisted ones.
    #[arg(short, long)]
    pub all: bool,
}

#[tokio::main]
async fn main() {
    let start = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.settings);

    let log_root = settings
        .as_ref()
        .map(|settings| settings.log_dir.clone())
        .unwrap_or_else(|_| PathBuf::from("logs"));
    let guards = init_logging(log_root, cli.command.name());

    let result = match settings {
        Ok(settings) => cli.run(settings).await,
        Err(error) => Err(error.into()),
    };

    let code = match result {
        Ok(()) => {
            info!("finished in {:.2?}", start.elapsed());
            0
        }
        Err(error) => {
            error!("{error:?}");
            1
        }
    };

    // INVARIANT: Flush file logs before exiting, exit skips destructors.
    drop(guards);
    exit(code)
}

fn init_logging(log_root: PathBuf, command: &str) -> Option<LogGuards> {
    match logging::init(&log_root, command) {
        Ok(guards) => {
            debug!("logging to {:?}", guards.dir().display());
            Some(guards)
        }
        Err(file_error) => {
            if let Err(error) = logging::init_console() {
                eprintln!("devboot: cannot set up logging: {error}");
                return None;
            }
            warn!("logging to console only: {file_error}");
            None
        }
    }
}

fn load_context(settings: Settings, steps: &mut Steps) -> Result<Context> {
    steps.begin("Loading credentials...");
    Context::load(settings, SystemSyscaller).with_context(|| "cannot continue without credential")
}

fn prompt_passphrase() -> Option<String> {
    Password::new("Passphrase for new SSH key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .inspect_err(|error| warn!("{error}"))
        .ok()
}

async fn run_setup(settings: Settings, opts: SetupOptions) -> Result<()> {
    let mut steps = Steps::new();
    let context = load_context(settings, &mut steps)?.with_test_mode(opts.test);
    let report = setup::run(&context, &mut steps, prompt_passphrase).await?;

    for (family, reconciliation) in report.packages {
        if !reconciliation.failed.is_empty() {
            warn!("{family} packages left uninstalled: {:?}", reconciliation.failed);
        }
    }
    info!("development environment is ready");

    Ok(())
}

async fn run_clean(settings: Settings, opts: CleanOpts) -> Result<()> {
    let mut steps = Steps::new();
    let context = load_context(settings, &mut steps)?;
    let options = CleanOptions {
        all_runtime_packages: opts.all_runtime_packages,
    };
    clean::run(&context, &mut steps, options).await?;
    info!("development environment has been cleaned up");

    Ok(())
}

fn run_reconcile(settings: Settings, opts: ReconcileOptions) -> Result<()> {
    let wishlist = match opts.file {
        Some(path) => path,
        None => settings
            .package_lists(opts.test)
            .get(opts.family)
            .to_path_buf(),
    };

    let mut steps = Steps::new();
    steps.begin(&format!("Installing {} packages...", opts.family));
    let reconciler = Reconciler::new(CliPackageManager::new(SystemSyscaller));
    let reconciliation = reconciler.reconcile(opts.family, &wishlist)?;
    info!(
        "{} installed, {} already present, {} failed",
        reconciliation.newly_installed.len(),
        reconciliation.already_installed.len(),
        reconciliation.failed.len()
    );

    Ok(())
}

fn run_uninstall(settings: Settings, opts: UninstallOptions) -> Result<()> {
    let allowed = if opts.all {
        None
    } else {
        Some(list_desired(settings.package_lists(false).get(opts.family))?)
    };

    let mut steps = Steps::new();
    steps.begin(&format!("Uninstalling {} packages...", opts.family));
    let reconciler = Reconciler::new(CliPackageManager::new(SystemSyscaller));
    let outcome = reconciler.uninstall_all(opts.family, allowed.as_ref())?;
    info!("{outcome:?}");

    Ok(())
}
