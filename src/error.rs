//! Domain-specific error types for the patch compiler.
//!
//! Internal modules return typed errors (e.g., [`PatchError`],
//! [`TransportError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! QuietdError
//! ├── Patch(PatchError)        : unknown toggles, document encoding
//! ├── Config(ConfigError)      : settings file parsing
//! └── Transport(TransportError): staging writes, apply gating
//! ```

use thiserror::Error;

/// Top-level error type for the compiler.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum QuietdError {
    /// Compile or encode error.
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    /// Settings file error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors raised by the compiler core and the document encoder.
///
/// These are contract violations, not environmental failures; nothing here is
/// worth retrying.
#[derive(Error, Debug)]
pub enum PatchError {
    /// The settings reference a toggle that is not registered.
    #[error("Unknown toggle '{0}'")]
    UnknownToggle(String),

    /// A value falls outside bool/int/string/string-list/map.
    #[error("Unsupported value type '{kind}' at key '{key}'")]
    UnsupportedValueType {
        /// Document key holding the value.
        key: String,
        /// Name of the offending value type.
        kind: &'static str,
    },

    /// The property-list serializer failed.
    #[error("Encoding failure: {0}")]
    EncodingFailure(#[from] plist::Error),
}

/// Errors that arise from loading the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A settings file was named explicitly but does not exist.
    #[error("Settings file not found: {path} (named by {origin})")]
    NotFound {
        /// Path that was named.
        path: String,
        /// Where the path came from: `--settings` or the environment.
        origin: &'static str,
    },

    /// The TOML file contains a syntax or shape error.
    #[error("Invalid TOML in {file}: {message}")]
    InvalidSyntax {
        /// Path to the offending file.
        file: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading the settings file.
    #[error("IO error reading settings file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A setting has a value that cannot be used.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// Setting key.
        key: String,
        /// Why the value was rejected.
        message: String,
    },
}

/// Errors that arise while handing a manifest to a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Another apply is still in flight.
    #[error("An apply is already in progress")]
    Busy,

    /// A descriptor path would escape its domain directory.
    #[error("Unsafe restore path '{path}' in domain {domain}")]
    UnsafePath {
        /// Descriptor domain.
        domain: String,
        /// Offending relative path.
        path: String,
    },

    /// Writing a staged file failed.
    #[error("IO error writing {path}: {source}")]
    Io {
        /// Path that could not be written.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest index could not be serialized.
    #[error("Failed to write manifest index: {0}")]
    Index(#[from] serde_json::Error),
}
