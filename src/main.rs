//! merge-gate CLI

mod cli;

use clap::{Parser, Subcommand};
use merge_gate::config::DEFAULT_CONFIG_PATH;
use merge_gate::report::EXIT_ERROR;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "merge-gate",
    version,
    about = "Merge-gate policy check for pull requests targeting restricted branches"
)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a pull request against the restriction rules
    Check(cli::CheckArgs),

    /// Validate the restriction rules and list them
    Validate {
        /// Path to the rules file
        #[arg(long, env = "MERGE_GATE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check(args) => cli::run_check(args).await,
        Commands::Validate { config } => Ok(cli::run_validate(&config)),
    };

    match result {
        Ok(code) => exit_code(code),
        Err(e) => {
            anstream::eprintln!("error: {e:#}");
            exit_code(EXIT_ERROR)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
