//! Skirmish CLI - run bot matches and leagues.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Skirmish - a deterministic bot-match engine
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single match between bot scripts
    Match {
        /// Bot scripts: local paths or http(s) URLs (2+ required)
        #[arg(required = true, num_args = 2..)]
        scripts: Vec<String>,

        /// Configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Run a round-robin league; bot list on stdin, markdown on stdout
    League {
        /// Parallel workers (default: LEAGUE_WORKERS env var, then 8)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    if let Err(e) = skirmish::logging::init() {
        eprintln!("Error: failed to install logger: {e}");
        return ExitCode::FAILURE;
    }

    let args = Args::parse();

    let result = match args.command {
        Commands::Match { scripts, config } => cli::match_cmd::execute(&scripts, &config),
        Commands::League { workers, config } => cli::league_cmd::execute(workers, &config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
