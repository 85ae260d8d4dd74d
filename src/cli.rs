//! Command-line interface definition.
use clap::{Parser, Subcommand};

use crate::config::Overrides;
use crate::document::DocumentFormat;
use crate::manifest::LogicalTarget;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "quietd",
    about = "Compile service and preference patches into restore manifests",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Settings file (defaults to $QUIETD_SETTINGS, then ./quietd.toml)
    #[arg(short, long, global = true)]
    pub settings: Option<std::path::PathBuf>,

    /// Turn toggles on
    #[arg(long, value_delimiter = ',', global = true)]
    pub enable: Vec<String>,

    /// Turn toggles off (applied after --enable)
    #[arg(long, value_delimiter = ',', global = true)]
    pub disable: Vec<String>,

    /// Wallet title written to the preferences document
    #[arg(long, global = true)]
    pub title: Option<String>,

    /// Fail on unknown toggle names
    #[arg(long, global = true, conflicts_with = "permissive")]
    pub strict: bool,

    /// Ignore unknown toggle names
    #[arg(long, global = true)]
    pub permissive: bool,

    /// Document encoding
    #[arg(long, value_enum, global = true)]
    pub format: Option<DocumentFormat>,

    /// Leave first-run setup alone
    #[arg(long, global = true)]
    pub no_skip_setup: bool,
}

impl GlobalOpts {
    /// Settings overrides taken from the command line.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            enable: self.enable.clone(),
            disable: self.disable.clone(),
            title: self.title.clone(),
            strict: if self.strict {
                Some(true)
            } else if self.permissive {
                Some(false)
            } else {
                None
            },
            format: self.format,
            skip_setup: self.no_skip_setup.then_some(false),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered toggles and baseline identifiers
    Toggles,
    /// Print a compiled document
    Compile(CompileOpts),
    /// Print the assembled restore manifest
    Manifest(ManifestOpts),
    /// Write the manifest into a staging directory
    Stage(StageOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Toggles => "toggles",
            Self::Compile(_) => "compile",
            Self::Manifest(_) => "manifest",
            Self::Stage(_) => "stage",
            Self::Version => "version",
        }
    }
}

/// Options for the `compile` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompileOpts {
    /// Document to print
    #[arg(long, value_enum, default_value = "disabled-services")]
    pub target: LogicalTarget,
}

/// Options for the `manifest` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ManifestOpts {
    /// Print the JSON index (with base64 content) instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Options for the `stage` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct StageOpts {
    /// Output directory
    #[arg(short, long)]
    pub out: std::path::PathBuf,

    /// Validate and list target paths without writing anything
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_compile_default_target() {
        let cli = Cli::parse_from(["quietd", "compile"]);
        assert!(
            matches!(&cli.command, Command::Compile(o) if o.target == LogicalTarget::DisabledServices)
        );
    }

    #[test]
    fn parse_compile_preferences_target() {
        let cli = Cli::parse_from(["quietd", "compile", "--target", "preferences"]);
        assert!(
            matches!(&cli.command, Command::Compile(o) if o.target == LogicalTarget::UserPreferences)
        );
    }

    #[test]
    fn parse_enable_and_disable_lists() {
        let cli = Cli::parse_from([
            "quietd",
            "--enable",
            "disable_ota,disable_tips",
            "manifest",
            "--disable",
            "disable_game_center",
        ]);
        assert_eq!(cli.global.enable, vec!["disable_ota", "disable_tips"]);
        assert_eq!(cli.global.disable, vec!["disable_game_center"]);
    }

    #[test]
    fn parse_stage_out() {
        let cli = Cli::parse_from(["quietd", "stage", "--out", "/tmp/stage"]);
        assert!(
            matches!(&cli.command, Command::Stage(o) if o.out == std::path::Path::new("/tmp/stage"))
        );
    }

    #[test]
    fn dry_run_belongs_to_stage() {
        let cli = Cli::parse_from(["quietd", "stage", "-o", "/tmp/stage", "--dry-run"]);
        assert!(matches!(&cli.command, Command::Stage(o) if o.dry_run));
        assert!(Cli::try_parse_from(["quietd", "--dry-run", "manifest"]).is_err());
        assert!(Cli::try_parse_from(["quietd", "compile", "-d"]).is_err());
    }

    #[test]
    fn parse_format_binary() {
        let cli = Cli::parse_from(["quietd", "--format", "binary", "manifest"]);
        assert_eq!(cli.global.format, Some(DocumentFormat::Binary));
    }

    #[test]
    fn strict_and_permissive_conflict() {
        let result = Cli::try_parse_from(["quietd", "--strict", "--permissive", "toggles"]);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_map_flags() {
        let cli = Cli::parse_from([
            "quietd",
            "--permissive",
            "--no-skip-setup",
            "--title",
            "Hitori",
            "manifest",
        ]);
        let overrides = cli.global.overrides();
        assert_eq!(overrides.strict, Some(false));
        assert_eq!(overrides.skip_setup, Some(false));
        assert_eq!(overrides.title.as_deref(), Some("Hitori"));
    }

    #[test]
    fn overrides_leave_unset_flags_alone() {
        let overrides = Cli::parse_from(["quietd", "toggles"]).global.overrides();
        assert_eq!(overrides.strict, None);
        assert_eq!(overrides.skip_setup, None);
        assert_eq!(overrides.format, None);
    }

    #[test]
    fn command_names() {
        assert_eq!(Cli::parse_from(["quietd", "version"]).command.name(), "version");
        assert_eq!(Cli::parse_from(["quietd", "toggles"]).command.name(), "toggles");
    }
}
