//! Output formatting utilities.
//!
//! Pretty printing for the runner.

use agora_governance::{DaoEvent, LoggedEvent, Proposal, ProposalStatus};
use agora_types::{format_units, Address, U256, DECIMALS};
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Format address (short version).
pub fn format_address(addr: &Address) -> String {
    addr.short()
}

/// Format an 18-decimal amount with a unit suffix.
pub fn format_amount(value: &U256, unit: &str) -> String {
    format!("{} {}", format_units(value, DECIMALS), unit)
}

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    println!("{}", format!("✗ {}", msg).red());
}

/// Print info message.
pub fn print_info(msg: &str) {
    println!("{}", format!("ℹ {}", msg).blue());
}

/// One-line description of a governance event.
pub fn describe_event(logged: &LoggedEvent) -> String {
    let body = match &logged.event {
        DaoEvent::Propose(e) => format!(
            "Propose id={} amount={} recipient={} creator={}",
            e.id,
            format_amount(&e.amount, "ETH"),
            format_address(&e.recipient),
            format_address(&e.creator),
        ),
        DaoEvent::Vote(e) => format!(
            "Vote id={} voter={} support={} weight={}",
            e.id,
            format_address(&e.voter),
            e.support.as_str(),
            format_units(&e.weight, DECIMALS),
        ),
        DaoEvent::Finalize(e) => format!("Finalize id={}", e.id),
    };
    format!("#{} {}", logged.seq, body)
}

#[derive(Tabled)]
struct ProposalRow {
    #[tabled(rename = "#")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Recipient")]
    recipient: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Votes For")]
    votes_for: String,
    #[tabled(rename = "Votes Against")]
    votes_against: String,
}

impl From<&Proposal> for ProposalRow {
    fn from(p: &Proposal) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            recipient: format_address(&p.recipient),
            amount: format_amount(&p.amount, "ETH"),
            status: p.status().label().to_string(),
            votes_for: format_units(&p.votes_for, DECIMALS),
            votes_against: format_units(&p.votes_against, DECIMALS),
        }
    }
}

/// Render proposals as a table, in id order.
pub fn proposal_table(proposals: &[Proposal]) -> String {
    let rows: Vec<ProposalRow> = proposals.iter().map(ProposalRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Colored status label.
pub fn status_label(status: ProposalStatus) -> String {
    match status {
        ProposalStatus::Approved => status.label().green().to_string(),
        ProposalStatus::InProgress => status.label().yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_governance::FinalizeEvent;
    use agora_types::ether;

    fn proposal(finalized: bool) -> Proposal {
        let mut p = Proposal::new(
            1,
            "Proposal 1".into(),
            "Desc 1".into(),
            ether(100),
            Address::derive("recipient"),
            Address::derive("investor1"),
        );
        p.finalized = finalized;
        p
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(&ether(100), "ETH"), "100.0 ETH");
    }

    #[test]
    fn test_table_columns() {
        let table = proposal_table(&[proposal(false), proposal(true)]);
        for header in ["#", "Name", "Recipient", "Amount", "Status", "Votes For", "Votes Against"] {
            assert!(table.contains(header), "missing {header}");
        }
        assert!(table.contains("In Progress"));
        assert!(table.contains("Approved"));
        assert!(table.contains("100.0 ETH"));
    }

    #[test]
    fn test_describe_event() {
        let logged = LoggedEvent {
            seq: 4,
            event: DaoEvent::Finalize(FinalizeEvent { id: 2 }),
        };
        assert_eq!(describe_event(&logged), "#4 Finalize id=2");
    }
}
