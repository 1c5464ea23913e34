//! Per-voter vote flags.
//!
//! Each (proposal, voter) pair may record exactly one side. The record is
//! written once and never cleared.

use agora_types::Address;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::GovernanceError;

/// Side of a vote.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VoteSupport {
    For,
    Against,
}

impl VoteSupport {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteSupport::For => "for",
            VoteSupport::Against => "against",
        }
    }
}

/// Vote flags: (proposal id, voter) -> side.
#[derive(Debug, Default, Clone, BorshSerialize, BorshDeserialize)]
pub struct VoteBook {
    records: HashMap<(u64, Address), VoteSupport>,
}

impl VoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote. Fails if the voter already voted on this proposal,
    /// regardless of side.
    pub fn record(
        &mut self,
        proposal_id: u64,
        voter: Address,
        support: VoteSupport,
    ) -> Result<(), GovernanceError> {
        if self.has_voted(proposal_id, voter) {
            return Err(GovernanceError::AlreadyVoted);
        }
        self.records.insert((proposal_id, voter), support);
        Ok(())
    }

    pub fn side(&self, proposal_id: u64, voter: Address) -> Option<VoteSupport> {
        self.records.get(&(proposal_id, voter)).copied()
    }

    pub fn has_voted(&self, proposal_id: u64, voter: Address) -> bool {
        self.records.contains_key(&(proposal_id, voter))
    }

    pub fn voted_for(&self, proposal_id: u64, voter: Address) -> bool {
        self.side(proposal_id, voter) == Some(VoteSupport::For)
    }

    pub fn voted_against(&self, proposal_id: u64, voter: Address) -> bool {
        self.side(proposal_id, voter) == Some(VoteSupport::Against)
    }
}
