//! Log file location and timestamps.
use std::path::PathBuf;

/// Environment variable that overrides the log directory.
pub const LOG_DIR_ENV: &str = "QUIETD_LOG_DIR";

/// Timestamp at the top of a log file.
pub(super) const HEADER_TIME: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Timestamp prefixed to each log line.
pub(super) const LINE_TIME: &str = "%H:%M:%S";

/// Directory holding the per-command log files.
///
/// `$QUIETD_LOG_DIR` if set, else `$XDG_CACHE_HOME/quietd`, else
/// `$HOME/.cache/quietd`. Nothing is created here.
pub(super) fn log_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    Some(cache.join("quietd"))
}

/// Log file for `command`, e.g. `<log dir>/stage.log`.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    Some(log_dir()?.join(format!("{command}.log")))
}

/// Current UTC time rendered with a chrono `format` string.
pub(super) fn utc_now(format: &str) -> String {
    chrono::Utc::now().format(format).to_string()
}
