use anyhow::Result;
use clap::Parser;

mod cli_bin;

use cli_bin::args::{Cli, Commands};
use cli_bin::commands::{list_command, run_command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Run(args) => run_command(args)?,
        Commands::List(args) => list_command(args)?,
    }
    Ok(())
}
