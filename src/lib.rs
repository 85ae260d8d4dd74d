//! Restore-manifest compiler for device service and preference patches.
//!
//! Turns a sparse set of toggles and preference values into property-list
//! documents, then into an ordered manifest of domain-addressed file writes
//! for an external restore transport.
//!
//! The public API is organised into layers, leaf first:
//!
//! - **[`document`]**: value model and XML/binary property-list encoding
//! - **[`registry`]**: toggle to identifier table and the fixed baseline
//! - **[`compiler`]**: presence-based merge of baseline, toggles, and free fields
//! - **[`manifest`]**: storage bindings and manifest assembly
//! - **[`transport`]**: transport seam, staging directory writer, apply gate
//! - **[`config`]** / **[`commands`]**: settings file and CLI orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod compiler;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod registry;
pub mod transport;

/// Serializes environment-variable mutation across parallel test threads.
#[cfg(test)]
pub(crate) static TEST_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
