//! Proposal records.
//!
//! A proposal asks the treasury to pay `amount` to `recipient`. It is created
//! in progress, collects for/against weight, and becomes approved once
//! finalized. Proposals are never removed.

use agora_types::{Address, U256};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;
use crate::voting::VoteSupport;

/// Proposal status as shown to members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Open for votes, not yet paid out
    InProgress,
    /// Finalized and paid out
    Approved,
}

impl ProposalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProposalStatus::InProgress => "In Progress",
            ProposalStatus::Approved => "Approved",
        }
    }
}

/// Treasury spending proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Proposal {
    /// Sequential id, starting at 1
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Amount of native currency requested from the treasury
    pub amount: U256,
    /// Receives `amount` on finalization
    pub recipient: Address,
    /// Member who created the proposal
    pub creator: Address,
    /// Token weight cast in favour
    pub votes_for: U256,
    /// Token weight cast against
    pub votes_against: U256,
    pub finalized: bool,
}

impl Proposal {
    /// Create a new proposal with empty tallies.
    pub fn new(
        id: u64,
        name: String,
        description: String,
        amount: U256,
        recipient: Address,
        creator: Address,
    ) -> Self {
        Self {
            id,
            name,
            description,
            amount,
            recipient,
            creator,
            votes_for: U256::ZERO,
            votes_against: U256::ZERO,
            finalized: false,
        }
    }

    pub fn status(&self) -> ProposalStatus {
        if self.finalized {
            ProposalStatus::Approved
        } else {
            ProposalStatus::InProgress
        }
    }

    /// Add `weight` to one side of the tally.
    pub fn record_vote(&mut self, support: VoteSupport, weight: U256) -> Result<(), GovernanceError> {
        let tally = match support {
            VoteSupport::For => &mut self.votes_for,
            VoteSupport::Against => &mut self.votes_against,
        };
        *tally = tally.checked_add(&weight).ok_or(GovernanceError::Overflow)?;
        Ok(())
    }

    /// Quorum is met only when the for-weight strictly exceeds it.
    pub fn meets_quorum(&self, quorum: &U256) -> bool {
        self.votes_for > *quorum
    }
}
