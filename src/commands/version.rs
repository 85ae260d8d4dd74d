//! Command: print version information.
use std::io::Write;

/// Version string, preferring the one injected by `build.rs`.
#[must_use]
pub fn version() -> &'static str {
    option_env!("QUIETD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to `out`.
///
/// # Errors
///
/// Returns an error if `out` cannot be written.
pub fn run(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "quietd {}", version())
}
