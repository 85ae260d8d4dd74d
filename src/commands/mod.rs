//! Subcommand orchestration.
pub mod compile;
pub mod manifest;
pub mod stage;
pub mod toggles;
pub mod version;

use std::collections::BTreeMap;

use crate::cli::GlobalOpts;
use crate::compiler::{self, UnknownTogglePolicy};
use crate::config::{self, Config};
use crate::document::CompiledDocument;
use crate::error::QuietdError;
use crate::logging::Logger;
use crate::manifest::{self as restore_manifest, LogicalTarget, Manifest};
use crate::registry::ToggleRegistry;

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates settings resolution so that each command does not have to
/// repeat the boilerplate. Failures stay typed as [`QuietdError`] until the
/// command body converts them.
#[derive(Debug)]
pub struct CommandSetup {
    /// Resolved settings.
    pub config: Config,
}

impl CommandSetup {
    /// Resolve the settings file, load it, and apply CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns [`QuietdError::Config`] if the settings file cannot be found,
    /// read, or parsed, and [`QuietdError::Patch`] if a preference value has
    /// an unsupported type.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self, QuietdError> {
        log.stage("Loading settings");
        let path = config::resolve_settings_path(global.settings.as_deref())?;
        let config = Config::load(path.as_deref(), &global.overrides())?;
        log.resolved(&config);

        for (name, enabled) in config.settings.iter() {
            log.debug(&format!("{name} = {enabled}"));
        }
        if config.policy == UnknownTogglePolicy::Permissive {
            for name in config.settings.unknown_toggles(ToggleRegistry::builtin()) {
                log.warn(&format!("ignoring unknown toggle '{name}'"));
            }
        }

        Ok(Self { config })
    }

    /// Compile every logical target.
    ///
    /// # Errors
    ///
    /// Returns [`QuietdError::Patch`] if a toggle is unknown under the strict
    /// policy.
    pub fn compile(
        &self,
        log: &Logger,
    ) -> Result<BTreeMap<LogicalTarget, CompiledDocument>, QuietdError> {
        log.stage("Compiling documents");
        let compiled = compiler::compile_targets(
            &self.config.settings,
            &self.config.preferences,
            self.config.policy,
        )?;
        for (target, doc) in &compiled {
            log.info(&format!("{target}: {} key(s)", doc.len()));
        }
        Ok(compiled)
    }

    /// Compile every target and assemble the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`QuietdError::Patch`] if compiling or encoding fails.
    pub fn manifest(&self, log: &Logger) -> Result<Manifest, QuietdError> {
        let compiled = self.compile(log)?;
        log.stage("Assembling manifest");
        let manifest = restore_manifest::assemble(&compiled, self.config.assemble)?;
        log.info(&format!("{} descriptor(s)", manifest.descriptors.len()));
        Ok(manifest)
    }
}

/// Options pointing at an empty settings file inside `dir`, so a test never
/// picks up `$QUIETD_SETTINGS` or `./quietd.toml`.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_global(dir: &std::path::Path) -> GlobalOpts {
    let path = dir.join(config::DEFAULT_SETTINGS_FILE);
    std::fs::write(&path, "").expect("write empty settings file");
    GlobalOpts {
        settings: Some(path),
        ..GlobalOpts::default()
    }
}
