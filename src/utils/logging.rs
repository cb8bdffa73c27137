//! Logging system initialization
//!
//! Two targets: a log file in the data directory (`dustoff.log`, rotated on
//! every startup with nine previous sessions kept) or stderr for interactive
//! use. `RUST_LOG` overrides the default level in both cases.

use crate::error::{DustOffError, Result, StringError};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

/// Maximum number of historical log files to keep (dustoff.log.1 through dustoff.log.9)
const MAX_LOG_FILES: u8 = 9;

const LOG_PREFIX: &str = "dustoff";
const LOG_SUFFIX: &str = "log";

/// Where log output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// `dustoff.log` inside this directory
    File(PathBuf),
    /// Compact output on stderr
    Stderr,
}

/// Initialize the global tracing subscriber
///
/// `default_level` is an `EnvFilter` directive used when `RUST_LOG` is unset.
pub fn init_logging(target: LogTarget, default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match target {
        LogTarget::File(log_dir) => {
            std::fs::create_dir_all(&log_dir)?;
            rotate_logs_on_startup(&log_dir.join(format!("{LOG_PREFIX}.{LOG_SUFFIX}")))?;

            // Rotation happens above, once per startup
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(LOG_PREFIX)
                .filename_suffix(LOG_SUFFIX)
                .build(&log_dir)
                .map_err(|e| DustOffError::ConfigError(Box::new(e)))?;

            let subscriber = fmt()
                .with_writer(file_appender)
                .with_env_filter(filter)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .finish();

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| DustOffError::ConfigError(Box::new(e)))?;
        }
        LogTarget::Stderr => {
            let subscriber = fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .with_target(false)
                .compact()
                .finish();

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| DustOffError::ConfigError(Box::new(e)))?;
        }
    }

    tracing::info!("DustOff v{} started", env!("CARGO_PKG_VERSION"));

    Ok(())
}

/// Shift `name.N` to `name.N+1`, dropping the oldest, then move the current
/// log to `name.1`. A fresh log is created by the appender.
fn rotate_logs_on_startup(log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let log_dir = log_path
        .parent()
        .ok_or_else(|| DustOffError::ConfigError(StringError::new("Invalid log path")))?;

    let log_name = log_path
        .file_name()
        .ok_or_else(|| DustOffError::ConfigError(StringError::new("Invalid log filename")))?
        .to_string_lossy();

    let oldest_log = log_dir.join(format!("{log_name}.{MAX_LOG_FILES}"));
    if oldest_log.exists() {
        std::fs::remove_file(&oldest_log)?;
    }

    for i in (1..MAX_LOG_FILES).rev() {
        let current_log = log_dir.join(format!("{log_name}.{i}"));
        if current_log.exists() {
            std::fs::rename(&current_log, log_dir.join(format!("{log_name}.{}", i + 1)))?;
        }
    }

    std::fs::rename(log_path, log_dir.join(format!("{log_name}.1")))?;

    Ok(())
}
