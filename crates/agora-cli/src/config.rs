//! Genesis and call-file handling.
//!
//! Both files are TOML. Accounts may be written as `0x` addresses or as one
//! of the devnet labels (`investor1`, `recipient`, ...), and amounts as base
//! units or with an `ether` / `tokens` suffix.

use agora_governance::Call;
use agora_types::genesis::DEV_ACCOUNTS;
use agora_types::{parse_units, Address, GenesisConfig, DECIMALS};
use anyhow::Context;
use std::path::Path;

/// Reject paths that climb out of the working tree.
fn check_path(path: &Path) -> anyhow::Result<()> {
    if path.to_string_lossy().contains("..") {
        anyhow::bail!("Invalid path: directory traversal detected");
    }
    Ok(())
}

/// Load and validate a genesis file.
pub fn load_genesis(path: &Path) -> anyhow::Result<GenesisConfig> {
    check_path(path)?;

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read genesis file '{}'", path.display()))?;
    let genesis: GenesisConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse genesis file '{}'", path.display()))?;
    genesis
        .validate()
        .with_context(|| format!("Invalid genesis file '{}'", path.display()))?;

    Ok(genesis)
}

/// Write `genesis` as TOML. Refuses to overwrite unless `force` is set.
pub fn save_genesis(genesis: &GenesisConfig, path: &Path, force: bool) -> anyhow::Result<()> {
    write_new(path, &toml::to_string_pretty(genesis)?, force)
}

pub fn write_new(path: &Path, contents: &str, force: bool) -> anyhow::Result<()> {
    check_path(path)?;
    if path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write '{}'", path.display()))
}

/// One entry of a call file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSpec {
    /// Caller as written in the file, for display
    pub label: String,
    pub caller: Address,
    pub call: Call,
}

/// Resolve a devnet label or `0x` address.
pub fn resolve_account(s: &str) -> anyhow::Result<Address> {
    let s = s.trim();
    if s.starts_with("0x") || s.starts_with("0X") {
        return s.parse().with_context(|| format!("Invalid address '{}'", s));
    }
    if DEV_ACCOUNTS.contains(&s) {
        return Ok(Address::derive(s));
    }
    anyhow::bail!("Unknown account '{}' (expected 0x address or one of {:?})", s, DEV_ACCOUNTS)
}

/// Normalize an amount to a base-unit decimal string.
fn resolve_amount(s: &str) -> anyhow::Result<String> {
    let s = s.trim();
    let whole = s
        .strip_suffix("ether")
        .or_else(|| s.strip_suffix("tokens"))
        .map(str::trim);

    match whole {
        Some(n) => Ok(parse_units(n, DECIMALS)?.to_string()),
        None => Ok(s.to_string()),
    }
}

/// Load a call file: a `[[calls]]` array whose entries carry `caller`, the
/// `call` tag and the call's fields.
pub fn load_calls(path: &Path) -> anyhow::Result<Vec<CallSpec>> {
    check_path(path)?;

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read call file '{}'", path.display()))?;
    parse_calls(&contents).with_context(|| format!("Invalid call file '{}'", path.display()))
}

pub fn parse_calls(contents: &str) -> anyhow::Result<Vec<CallSpec>> {
    let mut doc: toml::Table = toml::from_str(contents)?;
    let entries = match doc.remove("calls") {
        Some(toml::Value::Array(entries)) => entries,
        Some(_) => anyhow::bail!("'calls' must be an array of tables"),
        None => Vec::new(),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(entry).with_context(|| format!("call #{}", i + 1)))
        .collect()
}

fn parse_entry(entry: toml::Value) -> anyhow::Result<CallSpec> {
    let mut table = match entry {
        toml::Value::Table(table) => table,
        _ => anyhow::bail!("expected a table"),
    };

    let label = match table.remove("caller") {
        Some(toml::Value::String(s)) => s,
        _ => anyhow::bail!("missing 'caller'"),
    };
    let caller = resolve_account(&label)?;

    for key in ["recipient", "to"] {
        if let Some(toml::Value::String(s)) = table.get_mut(key) {
            *s = resolve_account(s)?.to_string();
        }
    }
    if let Some(toml::Value::String(s)) = table.get_mut("amount") {
        *s = resolve_amount(s)?;
    }

    let call: Call = toml::Value::Table(table).try_into()?;
    Ok(CallSpec { label, caller, call })
}

/// Call file replaying the devnet seeding: top the treasury up to 1,000
/// ether, pass three proposals, and leave a fourth open with two votes.
pub fn sample_calls() -> String {
    let mut out = String::from(
        "# Devnet seeding run\n\n\
         [[calls]]\n\
         caller = \"funder\"\n\
         call = \"fund_treasury\"\n\
         amount = \"900 ether\"\n",
    );

    for id in 1..=3 {
        out.push_str(&format!(
            "\n[[calls]]\n\
             caller = \"investor1\"\n\
             call = \"propose\"\n\
             name = \"Proposal {id}\"\n\
             description = \"Desc {id}\"\n\
             amount = \"100 ether\"\n\
             recipient = \"recipient\"\n"
        ));
        for voter in ["investor1", "investor2", "investor3"] {
            out.push_str(&format!(
                "\n[[calls]]\ncaller = \"{voter}\"\ncall = \"vote\"\nid = {id}\n"
            ));
        }
        out.push_str(&format!(
            "\n[[calls]]\ncaller = \"investor1\"\ncall = \"finalize\"\nid = {id}\n"
        ));
    }

    out.push_str(
        "\n[[calls]]\n\
         caller = \"investor1\"\n\
         call = \"propose\"\n\
         name = \"Proposal 4\"\n\
         description = \"Last one\"\n\
         amount = \"100 ether\"\n\
         recipient = \"recipient\"\n",
    );
    for voter in ["investor2", "investor3"] {
        out.push_str(&format!(
            "\n[[calls]]\ncaller = \"{voter}\"\ncall = \"vote\"\nid = 4\n"
        ));
    }

    out
}
