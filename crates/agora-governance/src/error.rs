use agora_types::U256;
use thiserror::Error;

/// Reasons a governance operation is rejected.
///
/// Every rejection leaves the ledger untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Caller holds no governance tokens")]
    NotAMember,

    #[error("Insufficient treasury: requested {requested}, available {available}")]
    InsufficientTreasury { requested: U256, available: U256 },

    #[error("Already voted")]
    AlreadyVoted,

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("Quorum not met: {votes} votes, must exceed {quorum}")]
    QuorumNotMet { votes: U256, quorum: U256 },

    #[error("Proposal already finalized: {0}")]
    AlreadyFinalized(u64),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
