//! `go-instrument` generates instrumented decorators for Go interfaces.
//!
//! Each decorator embeds the original interface, holds a metrics reporter,
//! and overrides the methods selected by `pattern:prefix` rules to report a
//! request, an error and a duration around the delegated call.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "go-instrument")]
#[command(about = "Generate instrumented decorators for Go interfaces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate decorators for the interfaces in each package directory
    Generate(commands::generate::GenerateArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, cli.verbose),
        Commands::Config { command } => {
            logging::init(cli.verbose, &instrument_config::types::LoggingConfig::default());
            commands::config::execute(command)
        }
    }
}
