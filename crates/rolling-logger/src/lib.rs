//! Rolling Logger
//!
//! Process-wide logging backend. `tracing` events, and `log` records through
//! the bridge installed with the subscriber, are written to size-rotated
//! files in a log directory. The most recent lines stay in memory so a
//! front end can show them without reading the files.

mod writer;

pub use writer::{RollingConfig, RollingGuard, RollingWriter};

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Log file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Logger not initialized")]
    NotInitialized,

    #[error("Failed to install subscriber: {0}")]
    Subscriber(String),
}

static WRITER: OnceLock<RollingWriter> = OnceLock::new();

/// Local wall-clock timestamps with milliseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Start logging to `<log_dir>/<app_name>.log` with default rotation
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(RollingConfig::new(log_dir, app_name))
}

pub fn init_logger_with(config: RollingConfig) -> Result<(), LoggerError> {
    if WRITER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let app_name = config.app_name.clone();
    let writer = RollingWriter::open(config)?;

    tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_timer(LocalTimestamp)
        .with_ansi(false)
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    WRITER
        .set(writer)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing::info!("{} logging started", app_name);
    Ok(())
}

fn ensure_initialized() -> Result<(), LoggerError> {
    WRITER.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::error!("{}", message);
    Ok(())
}

/// Last lines written by the global logger, oldest first
pub fn recent_lines() -> Vec<String> {
    WRITER
        .get()
        .map(RollingWriter::recent_lines)
        .unwrap_or_default()
}

/// Path of the file currently written to
pub fn current_log_file() -> Option<PathBuf> {
    WRITER.get().and_then(RollingWriter::current_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_subscriber_writes_file_and_ring() {
        let dir = tempfile::tempdir().unwrap();
        let config = RollingConfig::new(dir.path(), "scoped");
        let writer = RollingWriter::open(config.clone()).unwrap();

        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_timer(LocalTimestamp)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("draft saved");
            tracing::warn!(failures = 2, "partial save");
        });

        let lines = writer.recent_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("INFO") && lines[0].contains("draft saved"));
        assert!(lines[1].contains("WARN") && lines[1].contains("failures=2"));

        let content = std::fs::read_to_string(config.file_path(0)).unwrap();
        assert!(content.contains("partial save"));
    }

    #[test]
    fn test_global_logger_lifecycle() {
        // the only test touching the process-wide logger
        assert!(matches!(info("hello"), Err(LoggerError::NotInitialized)));
        assert!(matches!(error("oops"), Err(LoggerError::NotInitialized)));
        assert!(recent_lines().is_empty());
        assert!(current_log_file().is_none());

        let dir = tempfile::tempdir().unwrap();
        let config = RollingConfig::new(dir.path(), "global");
        init_logger_with(config.clone()).unwrap();
        assert_eq!(current_log_file(), Some(config.file_path(0)));

        log::info!("record from the log facade");
        info("message from the helper").unwrap();

        let lines = recent_lines();
        assert!(lines.iter().any(|line| line.contains("global logging started")));
        assert!(lines
            .iter()
            .any(|line| line.contains("INFO") && line.contains("record from the log facade")));
        assert!(lines.iter().any(|line| line.contains("message from the helper")));

        assert!(matches!(
            init_logger(dir.path(), "again"),
            Err(LoggerError::AlreadyInitialized)
        ));
    }
}
