// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Logging setup.
//!
//! Console output stays terse: compact format, no targets, no timestamps,
//! filtered through `RUST_LOG` with `info` as the default. Every run also
//! leaves a paper trail on disk under `<log root>/<command>/`:
//!
//! - `out.log`: everything at debug level and above.
//! - `err.log`: warnings and errors only.
//!
//! Both files are appended to, so previous runs are kept.

use std::path::{Path, PathBuf};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Keeps file writers alive.
///
/// Buffered log lines are flushed when this is dropped, so hold on to it
/// until the program is about to exit.
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
    dir: PathBuf,
}

impl LogGuards {
    /// Directory log files are written to.
    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }
}

/// Install global subscriber logging to console and to files.
///
/// # Errors
///
/// - Return [`LoggingError::CreateDir`] if log directory cannot be made.
/// - Return [`LoggingError::Appender`] if a log file cannot be opened.
/// - Return [`LoggingError::Filter`] if `RUST_LOG` holds an invalid filter.
pub fn init(log_root: impl AsRef<Path>, command: &str) -> Result<LogGuards> {
    let dir = log_root.as_ref().join(command);
    mkdirp::mkdirp(&dir).map_err(|source| LoggingError::CreateDir {
        source,
        path: dir.clone(),
    })?;

    let (out, out_guard) = tracing_appender::non_blocking(appender(&dir, "out.log")?);
    let (err, err_guard) = tracing_appender::non_blocking(appender(&dir, "err.log")?);

    tracing_subscriber::registry()
        .with(console_layer()?)
        .with(
            fmt::layer()
                .with_writer(out)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG),
        )
        .with(
            fmt::layer()
                .with_writer(err)
                .with_ansi(false)
                .with_filter(LevelFilter::WARN),
        )
        .init();

    Ok(LogGuards {
        _guards: vec![out_guard, err_guard],
        dir,
    })
}

/// Install global subscriber logging to console only.
///
/// # Errors
///
/// - Return [`LoggingError::Filter`] if `RUST_LOG` holds an invalid filter.
pub fn init_console() -> Result<()> {
    tracing_subscriber::registry().with(console_layer()?).init();
    Ok(())
}

fn console_layer<S>() -> Result<impl tracing_subscriber::Layer<S>>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    Ok(fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_filter(filter))
}

fn appender(dir: &Path, name: &str) -> Result<RollingFileAppender> {
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)?)
}

/// Logging setup error types.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Log directory could not be created.
    #[error("failed to create log directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Log file could not be opened.
    #[error(transparent)]
    Appender(#[from] InitError),

    /// Log filter is invalid.
    #[error(transparent)]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}

/// Friendly result alias :3
pub type Result<T, E = LoggingError> = std::result::Result<T, E>;
