//! CLI command implementations.

use agora_governance::{DaoHost, LoggedEvent};
use agora_types::genesis::DEV_ACCOUNTS;
use agora_types::{Address, GenesisConfig};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::config::{load_calls, load_genesis, sample_calls, save_genesis, write_new, CallSpec};
use crate::output::*;

/// Main CLI.
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(about = "Agora - token-weighted treasury governance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Log filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn", env = "AGORA_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the devnet genesis file
    Init {
        /// Output path
        #[arg(short, long, default_value = "genesis.toml")]
        out: PathBuf,

        /// Also write a sample call file to this path
        #[arg(long)]
        calls: Option<PathBuf>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Check a genesis file
    Validate {
        #[arg(short, long, default_value = "genesis.toml")]
        genesis: PathBuf,
    },

    /// Execute a call file against a fresh deployment
    Run {
        #[arg(short, long, default_value = "genesis.toml")]
        genesis: PathBuf,

        /// Call file
        #[arg(short, long)]
        calls: PathBuf,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Execute command.
pub async fn execute(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Init { out, calls, force } => init(&out, calls.as_deref(), force),
        Commands::Validate { genesis } => validate(&genesis),
        Commands::Run {
            genesis,
            calls,
            json,
        } => run(&genesis, &calls, json).await,
    }
}

fn init(out: &Path, calls: Option<&Path>, force: bool) -> anyhow::Result<()> {
    save_genesis(&GenesisConfig::devnet(), out, force)?;
    print_success(&format!("Genesis written to {}", out.display()));

    if let Some(path) = calls {
        write_new(path, &sample_calls(), force)?;
        print_success(&format!("Sample calls written to {}", path.display()));
    }
    Ok(())
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let genesis = load_genesis(path)?;

    print_success(&format!("{} is valid", path.display()));
    println!("  Deployer:     {}", genesis.deployer);
    println!(
        "  Token:        {} ({}), max supply {}",
        genesis.token.name, genesis.token.symbol, genesis.token.max_supply
    );
    println!("  Quorum:       {}", genesis.quorum);
    println!("  Allocations:  {}", genesis.allocations.len());
    println!("  Accounts:     {}", genesis.native_balances.len());
    match &genesis.treasury {
        Some(funding) => println!(
            "  Treasury:     {} from {}",
            format_amount(&funding.amount, "ETH"),
            format_address(&funding.funder)
        ),
        None => println!("  Treasury:     unfunded"),
    }
    Ok(())
}

/// Result of one call in a run.
struct Outcome {
    spec: CallSpec,
    result: Result<Vec<LoggedEvent>, String>,
}

/// Execute every call in order. A rejected call is recorded and the run goes on.
fn replay(host: &DaoHost, calls: Vec<CallSpec>) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(calls.len());
    for spec in calls {
        let result = host
            .execute(spec.caller, spec.call.clone())
            .map(|receipt| receipt.events)
            .map_err(|e| e.to_string());
        if let Err(reason) = &result {
            debug!(caller = %spec.caller, call = spec.call.name(), %reason, "call rejected");
        }
        outcomes.push(Outcome { spec, result });
    }
    outcomes
}

/// JSON report of a run: per-call outcomes, final proposals, treasury,
/// quorum, and the balances of the devnet accounts.
fn report(host: &DaoHost, outcomes: &[Outcome]) -> Value {
    let calls: Vec<_> = outcomes
        .iter()
        .map(|o| {
            json!({
                "caller": o.spec.label,
                "call": o.spec.call,
                "ok": o.result.is_ok(),
                "events": o.result.as_ref().ok(),
                "error": o.result.as_ref().err(),
            })
        })
        .collect();

    let accounts: Map<String, Value> = DEV_ACCOUNTS
        .iter()
        .map(|label| {
            let address = Address::derive(label);
            let entry = json!({
                "address": address,
                "native": host.native_balance(address),
                "tokens": host.token_balance(address),
            });
            (label.to_string(), entry)
        })
        .collect();

    json!({
        "calls": calls,
        "proposals": host.proposals(),
        "treasury": host.treasury_balance(),
        "quorum": host.quorum(),
        "accounts": accounts,
    })
}

async fn run(genesis_path: &Path, calls_path: &Path, json_output: bool) -> anyhow::Result<()> {
    let genesis = load_genesis(genesis_path)?;
    let calls = load_calls(calls_path)?;
    let host = DaoHost::from_genesis(&genesis)?;
    info!(calls = calls.len(), dao = %host.dao_address(), "starting run");

    let mut rx = host.subscribe();
    let streamer = tokio::spawn(async move {
        let mut seen = 0u64;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    debug!(seq = event.seq, event = event.event.name(), id = event.event.proposal_id(), "event");
                    seen += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged");
                    seen += skipped;
                }
                Err(RecvError::Closed) => break,
            }
        }
        seen
    });

    let outcomes = replay(&host, calls);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report(&host, &outcomes))?);
    } else {
        let proposals = host.proposals();
        let treasury = host.treasury_balance();
        let quorum = host.quorum();

        for (i, outcome) in outcomes.iter().enumerate() {
            let header = format!("[{}] {} {}", i + 1, outcome.spec.label, outcome.spec.call.name());
            match &outcome.result {
                Ok(events) => {
                    print_success(&header);
                    for event in events {
                        println!("    {}", describe_event(event));
                    }
                }
                Err(reason) => print_error(&format!("{}: {}", header, reason)),
            }
        }

        println!();
        println!("{}", proposal_table(&proposals));
        for p in &proposals {
            println!("  {} {}", format!("#{}", p.id).bold(), status_label(p.status()));
        }
        print_info(&format!("Treasury: {}", format_amount(&treasury, "ETH")));
        print_info(&format!("Quorum:   {}", format_amount(&quorum, "tokens")));
    }

    drop(host);
    let streamed = streamer.await?;
    info!(streamed, "run complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_calls;
    use agora_types::{ether, tokens};
    use tempfile::TempDir;

    #[test]
    fn test_cli_args() {
        let cli = Cli::parse_from([
            "agora",
            "--log-level",
            "debug",
            "run",
            "--calls",
            "calls.toml",
            "--json",
        ]);

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Run { genesis, calls, json } => {
                assert_eq!(genesis, PathBuf::from("genesis.toml"));
                assert_eq!(calls, PathBuf::from("calls.toml"));
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn devnet() -> DaoHost {
        DaoHost::from_genesis(&GenesisConfig::devnet()).unwrap()
    }

    #[test]
    fn test_seed_replay_outcome() {
        let host = devnet();
        let outcomes = replay(&host, parse_calls(&sample_calls()).unwrap());
        assert!(outcomes.iter().all(|o| o.result.is_ok()));

        let doc = report(&host, &outcomes);
        let proposals = doc["proposals"].as_array().unwrap();
        assert_eq!(proposals.len(), 4);
        for p in &proposals[..3] {
            assert_eq!(p["finalized"], true);
        }
        assert_eq!(proposals[3]["finalized"], false);
        assert_eq!(proposals[3]["votes_for"], tokens(400_000).to_string());

        assert_eq!(doc["treasury"], ether(700).to_string());
        assert_eq!(doc["accounts"]["recipient"]["native"], ether(10_300).to_string());
        assert_eq!(doc["accounts"]["funder"]["native"], ether(9_000).to_string());
    }

    #[test]
    fn test_rejected_call_does_not_stop_run() {
        let calls = parse_calls(
            r#"
            [[calls]]
            caller = "investor1"
            call = "propose"
            name = "Proposal 1"
            amount = "50 ether"
            recipient = "recipient"

            [[calls]]
            caller = "investor1"
            call = "vote"
            id = 1

            [[calls]]
            caller = "investor1"
            call = "vote"
            id = 1

            [[calls]]
            caller = "investor2"
            call = "vote"
            id = 1

            [[calls]]
            caller = "investor3"
            call = "vote"
            id = 1

            [[calls]]
            caller = "investor2"
            call = "finalize"
            id = 1
            "#,
        )
        .unwrap();

        let host = devnet();
        let outcomes = replay(&host, calls);
        let doc = report(&host, &outcomes);

        let calls = doc["calls"].as_array().unwrap();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[2]["ok"], false);
        assert!(calls[2]["error"].as_str().unwrap().contains("Already voted"));
        assert!(calls.iter().enumerate().all(|(i, c)| i == 2 || c["ok"] == true));

        assert_eq!(doc["proposals"][0]["finalized"], true);
        assert_eq!(doc["proposals"][0]["votes_for"], tokens(600_000).to_string());
        assert_eq!(doc["treasury"], ether(50).to_string());
    }

    #[tokio::test]
    async fn test_init_then_run() {
        let dir = TempDir::new().unwrap();
        let genesis = dir.path().join("genesis.toml");
        let calls = dir.path().join("calls.toml");

        execute(Commands::Init {
            out: genesis.clone(),
            calls: Some(calls.clone()),
            force: false,
        })
        .await
        .unwrap();
        execute(Commands::Validate { genesis: genesis.clone() }).await.unwrap();
        execute(Commands::Run {
            genesis,
            calls,
            json: true,
        })
        .await
        .unwrap();
    }
}
