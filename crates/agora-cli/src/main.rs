//! Agora CLI - run the governance ledger from the command line.
//!
//! Writes and validates genesis files and replays call files against a
//! fresh deployment.

pub mod commands;
pub mod config;
pub mod output;
pub mod telemetry;

use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();

    telemetry::init_telemetry(&cli.log_level, cli.log_json)?;

    if let Err(e) = commands::execute(cli.command).await {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }

    Ok(())
}
