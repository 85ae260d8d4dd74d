//! Command: write the manifest into a staging directory.
use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, StageOpts};
use crate::logging::Logger;
use crate::transport::{self, ApplyGate, StagingTransport};

/// Run the stage command.
///
/// With `--dry-run` every target path is validated and logged but nothing is
/// written.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, assembly fails, a path is
/// unsafe, or a file cannot be written.
pub fn run(global: &GlobalOpts, opts: &StageOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let manifest = setup.manifest(log)?;
    let staging = StagingTransport::new(&opts.out);

    if opts.dry_run {
        log.stage("Staging (dry run)");
        for d in &manifest.descriptors {
            let path = staging.target_path(d)?;
            log.dry_run(&format!(
                "would write {} ({} bytes)",
                path.display(),
                d.content.len()
            ));
        }
        return Ok(());
    }

    transport::apply_manifest(&manifest, &staging, &ApplyGate::new(), log)?;
    if let Some(path) = log.log_path() {
        log.debug(&format!("log: {}", path.display()));
    }
    Ok(())
}
