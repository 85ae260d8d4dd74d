//! Command: list registered toggles and the baseline.
use std::io::Write;

use anyhow::Result;

use crate::registry::{BaselineSet, BaselineState, ToggleRegistry};

/// Write the toggle table and baseline to `out`.
///
/// With `verbose`, every identifier is listed under its toggle.
///
/// # Errors
///
/// Returns an error if `out` cannot be written.
pub fn run(verbose: bool, out: &mut dyn Write) -> Result<()> {
    let registry = ToggleRegistry::builtin();
    let width = registry
        .all_toggle_names()
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(0);

    for group in registry.groups() {
        let kind = if group.applies_as_group { "group" } else { "each" };
        writeln!(
            out,
            "{:<width$}  {:>2} {kind}  {}",
            group.name,
            group.identifiers.len(),
            group.description,
        )?;
        if verbose {
            for id in &group.identifiers {
                writeln!(out, "    {id}")?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "baseline:")?;
    for entry in BaselineSet::builtin().entries() {
        let state = match entry.state {
            BaselineState::Active => "on",
            BaselineState::Inactive => "off",
        };
        writeln!(out, "    {:<3} {}", state, entry.identifier)?;
    }
    Ok(())
}
