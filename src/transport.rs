//! Restore transport seam, local staging transport, and the apply gate.
//!
//! Device transports live outside this crate. [`StagingTransport`] writes a
//! manifest into a directory tree instead, which is what the `stage` command
//! uses and what tests inspect.
use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine as _;
use serde::Serialize;
use sha2::{Digest as _, Sha256};

use crate::error::TransportError;
use crate::logging::Logger;
use crate::manifest::{Manifest, RestoreDescriptor};

/// File name of the index written next to the staged domains.
pub const INDEX_FILE: &str = "manifest.json";

/// Something that can deliver a manifest to its destination.
#[cfg_attr(test, mockall::automock)]
pub trait RestoreTransport {
    /// Write every descriptor in order and honour the reboot flag.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if delivery fails.
    fn apply(&self, manifest: &Manifest) -> Result<(), TransportError>;

    /// Human-readable destination for logs.
    fn describe(&self) -> String;
}

/// Writes descriptors to `<root>/<domain>/<relative_path>` plus an index.
#[derive(Debug, Clone)]
pub struct StagingTransport {
    root: PathBuf,
}

impl StagingTransport {
    /// Stage into `root`, creating it on first apply.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Destination path for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnsafePath`] if the domain is not a single
    /// path component or the relative path is absolute or climbs out with `..`.
    pub fn target_path(&self, descriptor: &RestoreDescriptor) -> Result<PathBuf, TransportError> {
        let unsafe_path = || TransportError::UnsafePath {
            domain: descriptor.domain.clone(),
            path: descriptor.relative_path.clone(),
        };
        let domain = Path::new(&descriptor.domain);
        let relative = Path::new(&descriptor.relative_path);
        let single_domain = matches!(
            domain.components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
        let normal_relative = relative.components().next().is_some()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !single_domain || !normal_relative {
            return Err(unsafe_path());
        }
        Ok(self.root.join(domain).join(relative))
    }
}

impl RestoreTransport for StagingTransport {
    fn apply(&self, manifest: &Manifest) -> Result<(), TransportError> {
        // Validate everything before the first write.
        let targets = manifest
            .descriptors
            .iter()
            .map(|d| self.target_path(d))
            .collect::<Result<Vec<_>, _>>()?;

        for (descriptor, path) in manifest.descriptors.iter().zip(&targets) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| TransportError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
            std::fs::write(path, &descriptor.content).map_err(|source| TransportError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }

        let index_path = self.root.join(INDEX_FILE);
        std::fs::write(&index_path, render_index(manifest)?).map_err(|source| {
            TransportError::Io {
                path: index_path.display().to_string(),
                source,
            }
        })
    }

    fn describe(&self) -> String {
        format!("staging directory {}", self.root.display())
    }
}

#[derive(Serialize)]
struct IndexEntry<'a> {
    domain: &'a str,
    relative_path: &'a str,
    owner: Option<u32>,
    group: Option<u32>,
    size: usize,
    sha256: String,
    content_base64: String,
}

#[derive(Serialize)]
struct Index<'a> {
    reboot: bool,
    files: Vec<IndexEntry<'a>>,
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for b in &digest {
        // write! to a String is infallible.
        write!(hex, "{b:02x}").unwrap_or(());
    }
    hex
}

/// Render the manifest as a pretty-printed JSON index.
///
/// # Errors
///
/// Returns [`TransportError::Index`] if serialization fails.
pub fn render_index(manifest: &Manifest) -> Result<String, TransportError> {
    let index = Index {
        reboot: manifest.reboot,
        files: manifest
            .descriptors
            .iter()
            .map(|d| IndexEntry {
                domain: &d.domain,
                relative_path: &d.relative_path,
                owner: d.owner,
                group: d.group,
                size: d.content.len(),
                sha256: sha256_hex(&d.content),
                content_base64: base64::engine::general_purpose::STANDARD.encode(&d.content),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&index)?)
}

/// Cloneable flag allowing at most one apply in flight.
#[derive(Debug, Clone, Default)]
pub struct ApplyGate {
    busy: Arc<AtomicBool>,
}

impl ApplyGate {
    /// Create an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Busy`] if another ticket is alive.
    pub fn try_begin(&self) -> Result<ApplyTicket, TransportError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TransportError::Busy)?;
        Ok(ApplyTicket {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Returns `true` while a ticket is alive.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of a claimed [`ApplyGate`]; releases it on drop.
#[derive(Debug)]
pub struct ApplyTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for ApplyTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Hand `manifest` to `transport` while holding `gate`.
///
/// # Errors
///
/// Returns [`TransportError::Busy`] if another apply is in flight, or the
/// transport's error.
pub fn apply_manifest(
    manifest: &Manifest,
    transport: &dyn RestoreTransport,
    gate: &ApplyGate,
    log: &Logger,
) -> Result<(), TransportError> {
    let _ticket = gate.try_begin()?;
    log.stage(&format!("Applying to {}", transport.describe()));
    for d in &manifest.descriptors {
        log.debug(&format!(
            "{}/{} ({} bytes)",
            d.domain,
            d.relative_path,
            d.content.len()
        ));
    }
    transport.apply(manifest)?;
    log.info(&format!(
        "wrote {} file(s){}",
        manifest.descriptors.len(),
        if manifest.reboot {
            ", reboot requested"
        } else {
            ""
        }
    ));
    Ok(())
}
