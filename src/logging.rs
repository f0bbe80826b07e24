//! Tracing setup: console output plus one append-only log file per day.

use crate::config::Config;
use crate::error::{Result, SearcherError};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file prefix; files are named `arxiv_searcher.YYYY-MM-DD.log`.
pub const LOG_FILE_PREFIX: &str = "arxiv_searcher";

/// Build the daily rolling appender under `config.log_dir`.
pub fn daily_appender(config: &Config) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(&config.log_dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&config.log_dir)
        .map_err(|e| SearcherError::Config(format!("Cannot open log file in {:?}: {}", config.log_dir, e)))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init(config: &Config, debug: bool) -> Result<WorkerGuard> {
    let log_level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let (file_writer, guard) = tracing_appender::non_blocking(daily_appender(config)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| SearcherError::Config(format!("Logging already initialized: {}", e)))?;

    Ok(guard)
}
