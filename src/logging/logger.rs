//! Structured logger with dry-run awareness.
use std::path::PathBuf;

use super::subscriber::{DRY_RUN_TARGET, RUN_TARGET, STAGE_TARGET};
use super::utils::log_file_path;
use crate::config::Config;

/// Structured logger facade over [`tracing`].
///
/// All messages are also written to `<log dir>/<command>.log` by the
/// subscriber's file layer, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

#[allow(clippy::unused_self)]
impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display at the end of a run. The file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record where the settings came from and how they resolved.
    pub fn resolved(&self, config: &Config) {
        let settings = config
            .source
            .as_deref()
            .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
        tracing::info!(
            target: RUN_TARGET,
            settings = %settings,
            policy = ?config.policy,
            format = ?config.assemble.format,
            setup_skip = config.assemble.include_setup_skip,
            "inputs"
        );
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn log_path_ends_with_command_name() {
        let log = Logger::new("compile");
        if let Some(path) = log.log_path() {
            assert!(path.ends_with("compile.log"));
        }
    }

    #[test]
    fn methods_do_not_panic_without_subscriber() {
        let log = Logger::new("test");
        log.stage("stage");
        log.info("info");
        log.debug("debug");
        log.warn("warn");
        log.error("error");
        log.dry_run("dry run");
    }
}
