// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed settings file and thin wrappers over
// the built-in tables so each test binary can compile and assemble without
// repeating boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use quietd_cli::compiler::{self, FreeFields, SettingsState, UnknownTogglePolicy};
use quietd_cli::document::CompiledDocument;
use quietd_cli::manifest::Manifest;
use quietd_cli::registry::{BaselineSet, ToggleRegistry};

/// Compile the disabled-services document from the built-in tables.
pub fn compile_services(settings: &SettingsState) -> CompiledDocument {
    compile_with_fields(settings, &FreeFields::new())
}

/// Compile against the built-in tables with extra free fields.
pub fn compile_with_fields(settings: &SettingsState, fields: &FreeFields) -> CompiledDocument {
    compiler::compile(
        settings,
        BaselineSet::builtin(),
        ToggleRegistry::builtin(),
        fields,
        UnknownTogglePolicy::Strict,
    )
    .expect("compile with built-in tables")
}

/// Render the descriptor addressing of a manifest, one line per descriptor.
pub fn layout(manifest: &Manifest) -> String {
    let id = |v: Option<u32>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
    let mut lines: Vec<String> = manifest
        .descriptors
        .iter()
        .map(|d| {
            format!(
                "{} {} owner={} group={}",
                d.domain,
                d.relative_path,
                id(d.owner),
                id(d.group)
            )
        })
        .collect();
    lines.push(format!("reboot={}", manifest.reboot));
    lines.join("\n")
}

/// A settings file inside a [`tempfile::TempDir`].
pub struct SettingsFixture {
    /// Directory holding the file; deleted on drop.
    pub dir: tempfile::TempDir,
    /// Path to `quietd.toml`.
    pub path: PathBuf,
}

impl SettingsFixture {
    /// Write `content` to a fresh `quietd.toml`.
    pub fn new(content: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("quietd.toml");
        std::fs::write(&path, content).expect("write settings file");
        Self { dir, path }
    }

    /// Path to a directory next to the settings file.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Path to the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
