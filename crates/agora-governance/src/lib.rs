//! Agora Governance - token-weighted treasury governance.
//!
//! This crate provides:
//! - The `Dao` ledger: proposals, for/against tallies, quorum-gated finalization
//! - Treasury accounting and the funds-transfer seam used on finalization
//! - An in-memory native-currency bank
//! - `DaoHost`, the mutex-guarded transaction boundary with event streaming

pub mod proposal;
pub mod voting;
pub mod treasury;
pub mod bank;
pub mod events;
pub mod dao;
pub mod host;
pub mod error;

pub use proposal::{Proposal, ProposalStatus};
pub use voting::{VoteBook, VoteSupport};
pub use treasury::{FundsTransfer, TransferError, Treasury, TreasuryEntry, TreasuryEntryKind};
pub use bank::NativeBank;
pub use events::{DaoEvent, EventLog, FinalizeEvent, LoggedEvent, ProposeEvent, VoteEvent};
pub use dao::Dao;
pub use host::{Call, DaoHost, HostError, Receipt};
pub use error::GovernanceError;
