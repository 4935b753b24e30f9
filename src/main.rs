use anyhow::Result;
use clap::Parser;

use caskbatch_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let command = match &args.command {
        cli::Command::Install(_) => "install",
        cli::Command::Plan => "plan",
        cli::Command::History => "history",
        cli::Command::Version => {
            commands::version::run();
            return Ok(());
        }
        cli::Command::Completions(opts) => {
            commands::completions::run(opts);
            return Ok(());
        }
    };
    logging::init_subscriber(args.verbose, command);
    let log = logging::Logger::new(command);

    match args.command {
        cli::Command::Install(opts) => commands::install::run(&args.global, &opts, &log),
        cli::Command::Plan => commands::plan::run(&args.global, &log),
        cli::Command::History => commands::history::run(&args.global, &log),
        cli::Command::Version | cli::Command::Completions(_) => Ok(()),
    }
}
