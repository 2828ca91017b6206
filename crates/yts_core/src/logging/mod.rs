//! Logging infrastructure for yt-spleet.
//!
//! This module provides:
//! - Per-job loggers with file + console dual output
//! - Compact mode that keeps raw tool output out of the log unless a tool fails
//! - Integration with the `tracing` ecosystem for library-level diagnostics
//!
//! # Example
//!
//! ```no_run
//! use yts_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new("my_job", "/path/to/logs", LogConfig::default(), None).unwrap();
//! logger.phase("Download");
//! logger.command("yt-dlp -x https://...");
//! logger.success("Job completed");
//! ```

mod job_logger;
mod types;

pub use job_logger::JobLogger;
pub use types::{ConsoleCallback, LogConfig, LogLevel, MessagePrefix};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber (stderr only).
///
/// Respects `RUST_LOG`, falling back to `default_level`.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .try_init();
}

/// Initialize tracing with stderr plus a daily-rolling file in `logs_dir`.
///
/// Returns the appender guard; dropping it flushes the file. Falls back to
/// stderr-only logging when the log directory cannot be used.
pub fn init_tracing_with_file(default_level: LogLevel, logs_dir: &Path) -> Option<WorkerGuard> {
    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("yt-spleet")
        .filename_suffix("log")
        .build(logs_dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            init_tracing(default_level);
            tracing::warn!("File logging disabled ({}): {}", logs_dir.display(), e);
            return None;
        }
    };

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .try_init();

    Some(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
