//! Governance events.
//!
//! Every successful state transition returns its typed event and appends it
//! to an `EventLog`. Observers poll the log with a cursor or subscribe to the
//! host's stream.

use agora_types::{Address, U256};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::voting::VoteSupport;

/// Emitted by `propose`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ProposeEvent {
    pub id: u64,
    pub amount: U256,
    pub recipient: Address,
    pub creator: Address,
}

/// Emitted by `vote` and `vote_against`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VoteEvent {
    pub id: u64,
    pub voter: Address,
    pub support: VoteSupport,
    /// Balance counted for this vote
    pub weight: U256,
}

/// Emitted by `finalize_proposal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FinalizeEvent {
    pub id: u64,
}

/// Any governance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(tag = "event")]
pub enum DaoEvent {
    Propose(ProposeEvent),
    Vote(VoteEvent),
    Finalize(FinalizeEvent),
}

impl DaoEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DaoEvent::Propose(_) => "Propose",
            DaoEvent::Vote(_) => "Vote",
            DaoEvent::Finalize(_) => "Finalize",
        }
    }

    /// Proposal the event refers to.
    pub fn proposal_id(&self) -> u64 {
        match self {
            DaoEvent::Propose(e) => e.id,
            DaoEvent::Vote(e) => e.id,
            DaoEvent::Finalize(e) => e.id,
        }
    }
}

impl From<ProposeEvent> for DaoEvent {
    fn from(e: ProposeEvent) -> Self {
        DaoEvent::Propose(e)
    }
}

impl From<VoteEvent> for DaoEvent {
    fn from(e: VoteEvent) -> Self {
        DaoEvent::Vote(e)
    }
}

impl From<FinalizeEvent> for DaoEvent {
    fn from(e: FinalizeEvent) -> Self {
        DaoEvent::Finalize(e)
    }
}

/// Event with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LoggedEvent {
    /// Zero-based, gap-free sequence number
    pub seq: u64,
    #[serde(flatten)]
    pub event: DaoEvent,
}

/// Append-only event log.
#[derive(Debug, Default, Clone, BorshSerialize, BorshDeserialize)]
pub struct EventLog {
    entries: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its logged form.
    pub fn append(&mut self, event: impl Into<DaoEvent>) -> LoggedEvent {
        let logged = LoggedEvent {
            seq: self.entries.len() as u64,
            event: event.into(),
        };
        self.entries.push(logged.clone());
        logged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number the next event will get; use as a polling cursor.
    pub fn cursor(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn all(&self) -> &[LoggedEvent] {
        &self.entries
    }

    /// Events with `seq >= cursor`.
    pub fn since(&self, cursor: u64) -> &[LoggedEvent] {
        let start = usize::try_from(cursor)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sequence_and_cursor() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        let first = log.append(FinalizeEvent { id: 1 });
        let second = log.append(FinalizeEvent { id: 2 });
        assert_eq!(first.seq, 0);
        assert_eq!(second.seq, 1);
        assert_eq!(log.cursor(), 2);

        assert_eq!(log.since(1).len(), 1);
        assert_eq!(log.since(1)[0].event.proposal_id(), 2);
        assert!(log.since(2).is_empty());
        assert!(log.since(u64::MAX).is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let logged = LoggedEvent {
            seq: 3,
            event: DaoEvent::Finalize(FinalizeEvent { id: 9 }),
        };
        let json = serde_json::to_value(&logged).unwrap();
        assert_eq!(json["event"], "Finalize");
        assert_eq!(json["id"], 9);
        assert_eq!(json["seq"], 3);
    }
}
