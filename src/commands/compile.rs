//! Command: print one compiled document.
use std::io::Write;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{CompileOpts, GlobalOpts};
use crate::document::encode;
use crate::logging::Logger;

/// Run the compile command, writing the encoded document to `out`.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, compiling or encoding
/// fails, or `out` cannot be written.
pub fn run(global: &GlobalOpts, opts: &CompileOpts, log: &Logger, out: &mut dyn Write) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let compiled = setup.compile(log)?;
    let document = compiled
        .get(&opts.target)
        .with_context(|| format!("no document compiled for {}", opts.target))?;
    let bytes = encode(document, setup.config.assemble.format)
        .with_context(|| format!("encoding {}", opts.target))?;
    out.write_all(&bytes).context("writing document")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::decode;
    use crate::commands::isolated_global;
    use crate::manifest::LogicalTarget;

    #[test]
    fn writes_decodable_disabled_services_document() {
        let dir = tempfile::tempdir().unwrap();
        let global = GlobalOpts {
            enable: vec!["disable_game_center".to_string()],
            ..isolated_global(dir.path())
        };
        let opts = CompileOpts {
            target: LogicalTarget::DisabledServices,
        };
        let mut out = Vec::new();
        run(&global, &opts, &Logger::new("test"), &mut out).unwrap();
        let doc = decode(&out).unwrap();
        assert!(doc.contains_key("com.apple.gamed"));
        assert!(doc.contains_key("com.apple.bootpd"));
    }
}
