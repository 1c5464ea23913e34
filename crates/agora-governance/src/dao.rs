//! The governance ledger.
//!
//! Members (positive token balance) propose treasury payouts, vote for or
//! against them with their current balance, and finalize a proposal once its
//! for-weight strictly exceeds the quorum. Every operation validates before it
//! mutates, so a rejected call leaves no trace.

use agora_token::BalanceOracle;
use agora_types::{Address, U256};
use borsh::{BorshDeserialize, BorshSerialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::GovernanceError;
use crate::events::{EventLog, FinalizeEvent, LoggedEvent, ProposeEvent, VoteEvent};
use crate::proposal::Proposal;
use crate::treasury::{FundsTransfer, Treasury};
use crate::voting::{VoteBook, VoteSupport};

/// Governance ledger state.
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct Dao {
    /// Address the ledger is deployed at
    address: Address,
    /// Governance token, read only through a `BalanceOracle`
    token: Address,
    /// Absolute for-weight that must be strictly exceeded
    quorum: U256,
    treasury: Treasury,
    proposal_count: u64,
    proposals: BTreeMap<u64, Proposal>,
    votes: VoteBook,
    events: EventLog,
}

impl Dao {
    /// Create a ledger bound to `token` with a fixed `quorum`.
    pub fn new(address: Address, token: Address, quorum: U256) -> Self {
        info!(dao = %address, %token, %quorum, "governance ledger created");
        Self {
            address,
            token,
            quorum,
            treasury: Treasury::new(),
            proposal_count: 0,
            proposals: BTreeMap::new(),
            votes: VoteBook::new(),
            events: EventLog::new(),
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Create a proposal to pay `amount` to `recipient`.
    pub fn propose<O: BalanceOracle + ?Sized>(
        &mut self,
        oracle: &O,
        caller: Address,
        name: impl Into<String>,
        description: impl Into<String>,
        amount: U256,
        recipient: Address,
    ) -> Result<ProposeEvent, GovernanceError> {
        self.require_member(oracle, caller)?;

        let available = self.treasury.balance();
        if amount > available {
            debug!(%caller, %amount, %available, "proposal exceeds treasury");
            return Err(GovernanceError::InsufficientTreasury {
                requested: amount,
                available,
            });
        }

        let id = self
            .proposal_count
            .checked_add(1)
            .ok_or(GovernanceError::Overflow)?;
        let proposal = Proposal::new(id, name.into(), description.into(), amount, recipient, caller);

        self.proposal_count = id;
        self.proposals.insert(id, proposal);

        let event = ProposeEvent {
            id,
            amount,
            recipient,
            creator: caller,
        };
        self.events.append(event.clone());

        info!(id, %caller, %amount, %recipient, "proposal created");
        Ok(event)
    }

    /// Vote in favour of proposal `id` with the caller's full balance.
    pub fn vote<O: BalanceOracle + ?Sized>(
        &mut self,
        oracle: &O,
        caller: Address,
        id: u64,
    ) -> Result<VoteEvent, GovernanceError> {
        self.cast(oracle, caller, id, VoteSupport::For)
    }

    /// Vote against proposal `id` with the caller's full balance.
    pub fn vote_against<O: BalanceOracle + ?Sized>(
        &mut self,
        oracle: &O,
        caller: Address,
        id: u64,
    ) -> Result<VoteEvent, GovernanceError> {
        self.cast(oracle, caller, id, VoteSupport::Against)
    }

    fn cast<O: BalanceOracle + ?Sized>(
        &mut self,
        oracle: &O,
        caller: Address,
        id: u64,
        support: VoteSupport,
    ) -> Result<VoteEvent, GovernanceError> {
        self.proposal(id)?;
        let weight = self.require_member(oracle, caller)?;

        if self.votes.has_voted(id, caller) {
            debug!(id, %caller, "double vote rejected");
            return Err(GovernanceError::AlreadyVoted);
        }

        // Tally first: it is the only step that can still fail.
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        proposal.record_vote(support, weight)?;
        self.votes.record(id, caller, support)?;

        let event = VoteEvent {
            id,
            voter: caller,
            support,
            weight,
        };
        self.events.append(event.clone());

        info!(id, voter = %caller, support = support.as_str(), %weight, "vote cast");
        Ok(event)
    }

    /// Pay out proposal `id` once its for-weight exceeds the quorum.
    ///
    /// The payout and the finalized flag commit together: if `funds` refuses
    /// the transfer the proposal stays open and the treasury is unchanged.
    pub fn finalize_proposal<O, F>(
        &mut self,
        oracle: &O,
        funds: &mut F,
        caller: Address,
        id: u64,
    ) -> Result<FinalizeEvent, GovernanceError>
    where
        O: BalanceOracle + ?Sized,
        F: FundsTransfer + ?Sized,
    {
        let proposal = self.proposal(id)?;
        let (recipient, amount, votes) = (proposal.recipient, proposal.amount, proposal.votes_for);
        let (finalized, quorum_met) = (proposal.finalized, proposal.meets_quorum(&self.quorum));

        self.require_member(oracle, caller)?;

        if finalized {
            debug!(id, %caller, "proposal already finalized");
            return Err(GovernanceError::AlreadyFinalized(id));
        }

        if !quorum_met {
            debug!(id, %votes, quorum = %self.quorum, "quorum not met");
            return Err(GovernanceError::QuorumNotMet {
                votes,
                quorum: self.quorum,
            });
        }

        if let Err(e) = self.treasury.disburse(funds, id, recipient, amount) {
            warn!(id, %recipient, %amount, error = %e, "payout failed");
            return Err(e);
        }

        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.finalized = true;
        }

        let event = FinalizeEvent { id };
        self.events.append(event.clone());

        info!(id, %recipient, %amount, "proposal finalized");
        Ok(event)
    }

    /// Funding interface: accept native currency into the treasury.
    pub fn deposit(&mut self, from: Address, amount: U256) -> Result<U256, GovernanceError> {
        let balance = self.treasury.deposit(from, amount)?;
        info!(%from, %amount, treasury = %balance, "treasury funded");
        Ok(balance)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn quorum(&self) -> U256 {
        self.quorum
    }

    pub fn proposal_count(&self) -> u64 {
        self.proposal_count
    }

    pub fn treasury_balance(&self) -> U256 {
        self.treasury.balance()
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// Proposal by id; ids run from 1 to `proposal_count`.
    pub fn proposal(&self, id: u64) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    /// All proposals in id order.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Whether `account` voted for proposal `id`.
    pub fn voted_for(&self, account: Address, id: u64) -> Result<bool, GovernanceError> {
        self.proposal(id)?;
        Ok(self.votes.voted_for(id, account))
    }

    /// Whether `account` voted against proposal `id`.
    pub fn voted_against(&self, account: Address, id: u64) -> Result<bool, GovernanceError> {
        self.proposal(id)?;
        Ok(self.votes.voted_against(id, account))
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Events appended at or after `cursor`.
    pub fn events_since(&self, cursor: u64) -> &[LoggedEvent] {
        self.events.since(cursor)
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Serialize the full ledger state.
    pub fn snapshot(&self) -> Result<Vec<u8>, GovernanceError> {
        borsh::to_vec(self).map_err(|e| GovernanceError::InvalidConfig(e.to_string()))
    }

    /// Restore a ledger from `snapshot` output.
    pub fn restore(bytes: &[u8]) -> Result<Self, GovernanceError> {
        borsh::from_slice(bytes).map_err(|e| GovernanceError::InvalidConfig(e.to_string()))
    }

    fn require_member<O: BalanceOracle + ?Sized>(
        &self,
        oracle: &O,
        caller: Address,
    ) -> Result<U256, GovernanceError> {
        let balance = oracle.balance_of(caller);
        if balance.is_zero() {
            debug!(%caller, "caller is not a member");
            return Err(GovernanceError::NotAMember);
        }
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::NativeBank;
    use agora_token::Token;
    use agora_types::{ether, tokens};

    struct Fixture {
        token: Token,
        bank: NativeBank,
        dao: Dao,
    }

    fn account(label: &str) -> Address {
        Address::derive(label)
    }

    /// Five investors with 200,000 tokens each, quorum of 500,000 tokens + 1,
    /// treasury holding 100 ether.
    fn setup() -> Fixture {
        let deployer = account("deployer");
        let (mut token, _) = Token::deploy(
            Address::contract(&deployer, 0),
            "GASton",
            "GSNT",
            1_000_000,
            deployer,
        )
        .unwrap();
        for i in 1..=5 {
            token
                .transfer(deployer, account(&format!("investor{}", i)), tokens(200_000))
                .unwrap();
        }

        let quorum: U256 = "500000000000000000000001".parse().unwrap();
        let mut dao = Dao::new(Address::contract(&deployer, 1), token.address, quorum);
        dao.deposit(account("funder"), ether(100)).unwrap();

        Fixture {
            token,
            bank: NativeBank::new(),
            dao,
        }
    }

    fn propose_default(f: &mut Fixture) -> ProposeEvent {
        f.dao
            .propose(&f.token, account("investor1"), "Proposal 1", "Desc 1", ether(100), account("recipient"))
            .unwrap()
    }

    #[test]
    fn test_construction_reads() {
        let f = setup();
        assert_eq!(f.dao.token(), f.token.address);
        assert_eq!(f.dao.quorum().to_string(), "500000000000000000000001");
        assert_eq!(f.dao.proposal_count(), 0);
        assert_eq!(f.dao.treasury_balance(), ether(100));
    }

    #[test]
    fn test_propose_stores_proposal() {
        let mut f = setup();
        let event = propose_default(&mut f);

        assert_eq!(event.id, 1);
        assert_eq!(event.creator, account("investor1"));
        assert_eq!(f.dao.proposal_count(), 1);

        let p = f.dao.proposal(1).unwrap();
        assert_eq!(p.name, "Proposal 1");
        assert_eq!(p.description, "Desc 1");
        assert_eq!(p.amount, ether(100));
        assert_eq!(p.recipient, account("recipient"));
        assert!(!p.finalized);
    }

    #[test]
    fn test_propose_rejects_amount_over_treasury() {
        let mut f = setup();
        let result = f.dao.propose(
            &f.token,
            account("investor1"),
            "Proposal 1",
            "",
            ether(1000),
            account("recipient"),
        );
        assert_eq!(
            result,
            Err(GovernanceError::InsufficientTreasury {
                requested: ether(1000),
                available: ether(100),
            })
        );
        assert_eq!(f.dao.proposal_count(), 0);
        assert!(f.dao.events().is_empty());
    }

    #[test]
    fn test_propose_rejects_non_member() {
        let mut f = setup();
        let result = f.dao.propose(&f.token, account("user"), "P", "", ether(1), account("recipient"));
        assert_eq!(result, Err(GovernanceError::NotAMember));
    }

    #[test]
    fn test_vote_adds_full_balance() {
        let mut f = setup();
        propose_default(&mut f);

        let event = f.dao.vote(&f.token, account("investor1"), 1).unwrap();
        assert_eq!(event.voter, account("investor1"));
        assert_eq!(event.weight, tokens(200_000));
        assert_eq!(f.dao.proposal(1).unwrap().votes_for, tokens(200_000));
        assert!(f.dao.voted_for(account("investor1"), 1).unwrap());
        assert!(!f.dao.voted_against(account("investor1"), 1).unwrap());
    }

    #[test]
    fn test_vote_against_tallies_separately() {
        let mut f = setup();
        propose_default(&mut f);

        f.dao.vote(&f.token, account("investor1"), 1).unwrap();
        f.dao.vote_against(&f.token, account("investor2"), 1).unwrap();

        let p = f.dao.proposal(1).unwrap();
        assert_eq!(p.votes_for, tokens(200_000));
        assert_eq!(p.votes_against, tokens(200_000));
        assert!(f.dao.voted_against(account("investor2"), 1).unwrap());
    }

    #[test]
    fn test_double_vote_rejected_across_sides() {
        let mut f = setup();
        propose_default(&mut f);

        f.dao.vote(&f.token, account("investor1"), 1).unwrap();
        assert_eq!(
            f.dao.vote(&f.token, account("investor1"), 1),
            Err(GovernanceError::AlreadyVoted)
        );
        assert_eq!(
            f.dao.vote_against(&f.token, account("investor1"), 1),
            Err(GovernanceError::AlreadyVoted)
        );
        assert_eq!(f.dao.proposal(1).unwrap().votes_for, tokens(200_000));
        assert!(f.dao.proposal(1).unwrap().votes_against.is_zero());
    }

    #[test]
    fn test_vote_unknown_proposal() {
        let mut f = setup();
        assert_eq!(
            f.dao.vote(&f.token, account("investor1"), 1),
            Err(GovernanceError::ProposalNotFound(1))
        );
        assert_eq!(
            f.dao.voted_for(account("investor1"), 0),
            Err(GovernanceError::ProposalNotFound(0))
        );
    }

    #[test]
    fn test_vote_weight_not_retroactive() {
        let mut f = setup();
        propose_default(&mut f);

        f.dao.vote(&f.token, account("investor1"), 1).unwrap();
        f.token
            .transfer(account("investor1"), account("investor2"), tokens(200_000))
            .unwrap();

        assert_eq!(f.dao.proposal(1).unwrap().votes_for, tokens(200_000));
        f.dao.vote(&f.token, account("investor2"), 1).unwrap();
        assert_eq!(f.dao.proposal(1).unwrap().votes_for, tokens(600_000));
    }

    #[test]
    fn test_finalize_pays_recipient() {
        let mut f = setup();
        propose_default(&mut f);
        for i in 1..=3 {
            f.dao.vote(&f.token, account(&format!("investor{}", i)), 1).unwrap();
        }

        let event = f
            .dao
            .finalize_proposal(&f.token, &mut f.bank, account("investor1"), 1)
            .unwrap();

        assert_eq!(event.id, 1);
        assert!(f.dao.proposal(1).unwrap().finalized);
        assert_eq!(f.bank.balance_of(account("recipient")), ether(100));
        assert_eq!(f.dao.treasury_balance(), U256::ZERO);
    }

    #[test]
    fn test_finalize_requires_strictly_more_than_quorum() {
        let mut f = setup();
        let deployer = account("deployer");
        // Quorum exactly equal to two investors' weight.
        let mut dao = Dao::new(Address::contract(&deployer, 1), f.token.address, tokens(400_000));
        dao.deposit(account("funder"), ether(100)).unwrap();
        dao.propose(&f.token, account("investor1"), "P", "", ether(1), account("recipient"))
            .unwrap();
        dao.vote(&f.token, account("investor1"), 1).unwrap();
        dao.vote(&f.token, account("investor2"), 1).unwrap();

        assert_eq!(
            dao.finalize_proposal(&f.token, &mut f.bank, account("investor1"), 1),
            Err(GovernanceError::QuorumNotMet {
                votes: tokens(400_000),
                quorum: tokens(400_000),
            })
        );

        dao.vote(&f.token, account("investor3"), 1).unwrap();
        dao.finalize_proposal(&f.token, &mut f.bank, account("investor1"), 1)
            .unwrap();
    }

    #[test]
    fn test_finalize_twice_rejected() {
        let mut f = setup();
        propose_default(&mut f);
        for i in 1..=3 {
            f.dao.vote(&f.token, account(&format!("investor{}", i)), 1).unwrap();
        }
        f.dao
            .finalize_proposal(&f.token, &mut f.bank, account("investor1"), 1)
            .unwrap();

        // More votes afterwards change nothing.
        f.dao.vote(&f.token, account("investor4"), 1).unwrap();
        assert_eq!(
            f.dao.finalize_proposal(&f.token, &mut f.bank, account("investor2"), 1),
            Err(GovernanceError::AlreadyFinalized(1))
        );
        assert_eq!(f.bank.balance_of(account("recipient")), ether(100));
    }

    #[test]
    fn test_finalize_rejects_non_member() {
        let mut f = setup();
        propose_default(&mut f);
        for i in 1..=3 {
            f.dao.vote(&f.token, account(&format!("investor{}", i)), 1).unwrap();
        }
        assert_eq!(
            f.dao.finalize_proposal(&f.token, &mut f.bank, account("user"), 1),
            Err(GovernanceError::NotAMember)
        );
        assert!(!f.dao.proposal(1).unwrap().finalized);
    }

    #[test]
    fn test_refused_payout_keeps_proposal_open() {
        let mut f = setup();
        propose_default(&mut f);
        for i in 1..=3 {
            f.dao.vote(&f.token, account(&format!("investor{}", i)), 1).unwrap();
        }
        f.bank.reject_inbound(account("recipient"));
        let events_before = f.dao.events().len();

        let result = f
            .dao
            .finalize_proposal(&f.token, &mut f.bank, account("investor1"), 1);

        assert!(matches!(result, Err(GovernanceError::TransferFailed(_))));
        assert!(!f.dao.proposal(1).unwrap().finalized);
        assert_eq!(f.dao.treasury_balance(), ether(100));
        assert_eq!(f.dao.events().len(), events_before);

        f.bank.accept_inbound(account("recipient"));
        f.dao
            .finalize_proposal(&f.token, &mut f.bank, account("investor1"), 1)
            .unwrap();
    }

    #[test]
    fn test_drained_treasury_fails_transfer() {
        let mut f = setup();
        // Two proposals each asking for the whole treasury.
        propose_default(&mut f);
        propose_default(&mut f);
        for id in 1..=2 {
            for i in 1..=3 {
                f.dao.vote(&f.token, account(&format!("investor{}", i)), id).unwrap();
            }
        }

        f.dao
            .finalize_proposal(&f.token, &mut f.bank, account("investor1"), 1)
            .unwrap();
        let result = f
            .dao
            .finalize_proposal(&f.token, &mut f.bank, account("investor1"), 2);
        assert!(matches!(result, Err(GovernanceError::TransferFailed(_))));
        assert!(!f.dao.proposal(2).unwrap().finalized);
    }

    #[test]
    fn test_events_logged_in_order() {
        let mut f = setup();
        propose_default(&mut f);
        f.dao.vote(&f.token, account("investor1"), 1).unwrap();

        let names: Vec<_> = f.dao.events().all().iter().map(|e| e.event.name()).collect();
        assert_eq!(names, vec!["Propose", "Vote"]);
        assert_eq!(f.dao.events_since(1).len(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut f = setup();
        propose_default(&mut f);
        f.dao.vote(&f.token, account("investor1"), 1).unwrap();

        let bytes = f.dao.snapshot().unwrap();
        let mut restored = Dao::restore(&bytes).unwrap();

        assert_eq!(restored.proposal(1).unwrap(), f.dao.proposal(1).unwrap());
        assert_eq!(restored.treasury_balance(), ether(100));
        assert_eq!(
            restored.vote(&f.token, account("investor1"), 1),
            Err(GovernanceError::AlreadyVoted)
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Each voter counts once, and finalization succeeds exactly when
            /// the for-weight is strictly above the quorum.
            #[test]
            fn prop_tally_and_quorum(
                votes in proptest::collection::vec((0usize..5, any::<bool>()), 0..20),
                quorum in 0u64..1_000_000,
            ) {
                let f = setup();
                let mut bank = NativeBank::new();
                let mut dao = Dao::new(Address::ZERO, f.token.address, tokens(quorum));
                dao.deposit(account("funder"), ether(1)).unwrap();
                dao.propose(&f.token, account("investor1"), "P", "", ether(1), account("recipient"))
                    .unwrap();

                let mut expected_for = U256::ZERO;
                let mut voted = std::collections::HashSet::new();
                for (idx, support) in votes {
                    let voter = account(&format!("investor{}", idx + 1));
                    let result = if support {
                        dao.vote(&f.token, voter, 1)
                    } else {
                        dao.vote_against(&f.token, voter, 1)
                    };
                    if voted.insert(voter) {
                        prop_assert!(result.is_ok());
                        if support {
                            expected_for = expected_for.checked_add(&tokens(200_000)).unwrap();
                        }
                    } else {
                        prop_assert_eq!(result, Err(GovernanceError::AlreadyVoted));
                    }
                }

                prop_assert_eq!(dao.proposal(1).unwrap().votes_for, expected_for);
                let finalized = dao.finalize_proposal(&f.token, &mut bank, account("investor1"), 1);
                prop_assert_eq!(finalized.is_ok(), expected_for > tokens(quorum));
            }
        }
    }
}
