use std::io::Write as _;

use anyhow::Result;
use clap::Parser;
use quietd_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    let command = args.command.name();
    logging::init_subscriber(args.verbose, command);
    let log = logging::Logger::new(command);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        cli::Command::Toggles => commands::toggles::run(args.verbose, &mut out)?,
        cli::Command::Compile(opts) => commands::compile::run(&args.global, opts, &log, &mut out)?,
        cli::Command::Manifest(opts) => {
            commands::manifest::run(&args.global, opts, &log, &mut out)?;
        }
        cli::Command::Stage(opts) => commands::stage::run(&args.global, opts, &log)?,
        cli::Command::Version => commands::version::run(&mut out)?,
    }
    out.flush()?;
    Ok(())
}
