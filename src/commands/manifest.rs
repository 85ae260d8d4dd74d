//! Command: print the assembled restore manifest.
use std::io::Write;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, ManifestOpts};
use crate::logging::Logger;
use crate::manifest::Manifest;
use crate::transport::{render_index, sha256_hex};

/// Run the manifest command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, assembly fails, or `out`
/// cannot be written.
pub fn run(
    global: &GlobalOpts,
    opts: &ManifestOpts,
    log: &Logger,
    out: &mut dyn Write,
) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let manifest = setup.manifest(log)?;
    if opts.json {
        writeln!(out, "{}", render_index(&manifest)?).context("writing manifest")?;
    } else {
        write_table(&manifest, out).context("writing manifest")?;
    }
    Ok(())
}

fn owner_label(id: Option<u32>) -> String {
    id.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// One line per descriptor followed by the reboot flag.
fn write_table(manifest: &Manifest, out: &mut dyn Write) -> std::io::Result<()> {
    for d in &manifest.descriptors {
        let digest = sha256_hex(&d.content);
        writeln!(
            out,
            "{}\t{}\t{}:{}\t{}\t{}",
            d.domain,
            d.relative_path,
            owner_label(d.owner),
            owner_label(d.group),
            d.content.len(),
            digest.get(..12).unwrap_or(&digest),
        )?;
    }
    writeln!(out, "reboot\t{}", manifest.reboot)
}
