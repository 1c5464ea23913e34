//! Transaction boundary around the ledger.
//!
//! `DaoHost` owns the token, the native bank and the `Dao` behind a single
//! mutex, so every call sees and commits one consistent world. Successful
//! calls publish their events to subscribers in log order.

use agora_token::{Token, TokenError, TransferEvent};
use agora_types::{Address, GenesisConfig, TypesError, U256};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::bank::NativeBank;
use crate::dao::Dao;
use crate::error::GovernanceError;
use crate::events::{FinalizeEvent, LoggedEvent, ProposeEvent, VoteEvent};
use crate::proposal::Proposal;
use crate::treasury::TransferError;

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Host-level errors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Invalid genesis: {0}")]
    Genesis(#[from] TypesError),

    #[error("Insufficient funds in {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: Address,
        available: U256,
        required: U256,
    },
}

/// A single state-changing call, as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    Propose {
        name: String,
        #[serde(default)]
        description: String,
        amount: U256,
        recipient: Address,
    },
    Vote {
        id: u64,
    },
    VoteAgainst {
        id: u64,
    },
    Finalize {
        id: u64,
    },
    FundTreasury {
        amount: U256,
    },
    TransferTokens {
        to: Address,
        amount: U256,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Propose { .. } => "propose",
            Call::Vote { .. } => "vote",
            Call::VoteAgainst { .. } => "vote_against",
            Call::Finalize { .. } => "finalize",
            Call::FundTreasury { .. } => "fund_treasury",
            Call::TransferTokens { .. } => "transfer_tokens",
        }
    }
}

/// Outcome of a successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Governance events the call appended
    pub events: Vec<LoggedEvent>,
}

struct World {
    token: Token,
    bank: NativeBank,
    dao: Dao,
}

/// Serialized access to a DAO and the chain state around it.
pub struct DaoHost {
    world: Mutex<World>,
    events_tx: broadcast::Sender<LoggedEvent>,
}

impl DaoHost {
    /// Deploy the token and the DAO described by `genesis`.
    ///
    /// The token lands at the deployer's first contract address and the DAO
    /// at the second. Allocations are transferred out of the deployer's
    /// minted supply, then the treasury is funded from the funder's balance.
    pub fn from_genesis(genesis: &GenesisConfig) -> Result<Self, HostError> {
        genesis.validate()?;

        let deployer = genesis.deployer;
        let (mut token, _) = Token::deploy(
            Address::contract(&deployer, 0),
            genesis.token.name.as_str(),
            genesis.token.symbol.as_str(),
            genesis.token.max_supply,
            deployer,
        )?;
        for alloc in &genesis.allocations {
            token.transfer(deployer, alloc.holder, alloc.amount)?;
        }

        let bank = NativeBank::from_allocs(&genesis.native_balances)?;
        let dao = Dao::new(Address::contract(&deployer, 1), token.address, genesis.quorum);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let host = Self {
            world: Mutex::new(World { token, bank, dao }),
            events_tx,
        };

        if let Some(funding) = &genesis.treasury {
            host.fund_treasury(funding.funder, funding.amount)?;
        }

        info!(
            token = %host.token_address(),
            dao = %host.dao_address(),
            treasury = %host.treasury_balance(),
            "genesis applied"
        );
        Ok(host)
    }

    /// Run `op` under the lock and publish whatever events it appended.
    fn commit<T>(
        &self,
        op: impl FnOnce(&mut World) -> Result<T, HostError>,
    ) -> Result<(T, Vec<LoggedEvent>), HostError> {
        let mut world = self.world.lock();
        let cursor = world.dao.events().cursor();

        let value = op(&mut *world)?;

        let appended = world.dao.events_since(cursor).to_vec();
        for event in &appended {
            // No subscribers is fine; the log keeps everything.
            let _ = self.events_tx.send(event.clone());
        }
        Ok((value, appended))
    }

    /// Execute a call on behalf of `caller`.
    pub fn execute(&self, caller: Address, call: Call) -> Result<Receipt, HostError> {
        debug!(%caller, call = call.name(), "executing call");
        let events = match call {
            Call::Propose {
                name,
                description,
                amount,
                recipient,
            } => {
                self.commit(|w| {
                    Ok(w.dao.propose(&w.token, caller, name, description, amount, recipient)?)
                })?
                .1
            }
            Call::Vote { id } => self.commit(|w| Ok(w.dao.vote(&w.token, caller, id)?))?.1,
            Call::VoteAgainst { id } => {
                self.commit(|w| Ok(w.dao.vote_against(&w.token, caller, id)?))?.1
            }
            Call::Finalize { id } => {
                self.commit(|w| Ok(w.dao.finalize_proposal(&w.token, &mut w.bank, caller, id)?))?
                    .1
            }
            Call::FundTreasury { amount } => self.commit(|w| Self::fund(w, caller, amount))?.1,
            Call::TransferTokens { to, amount } => {
                self.commit(|w| Ok(w.token.transfer(caller, to, amount)?))?.1
            }
        };
        Ok(Receipt { events })
    }

    pub fn propose(
        &self,
        caller: Address,
        name: impl Into<String>,
        description: impl Into<String>,
        amount: U256,
        recipient: Address,
    ) -> Result<ProposeEvent, HostError> {
        let (name, description) = (name.into(), description.into());
        self.commit(|w| Ok(w.dao.propose(&w.token, caller, name, description, amount, recipient)?))
            .map(|(event, _)| event)
    }

    pub fn vote(&self, caller: Address, id: u64) -> Result<VoteEvent, HostError> {
        self.commit(|w| Ok(w.dao.vote(&w.token, caller, id)?))
            .map(|(event, _)| event)
    }

    pub fn vote_against(&self, caller: Address, id: u64) -> Result<VoteEvent, HostError> {
        self.commit(|w| Ok(w.dao.vote_against(&w.token, caller, id)?))
            .map(|(event, _)| event)
    }

    pub fn finalize_proposal(&self, caller: Address, id: u64) -> Result<FinalizeEvent, HostError> {
        self.commit(|w| Ok(w.dao.finalize_proposal(&w.token, &mut w.bank, caller, id)?))
            .map(|(event, _)| event)
    }

    /// Move native currency from `from` into the treasury.
    pub fn fund_treasury(&self, from: Address, amount: U256) -> Result<U256, HostError> {
        self.commit(|w| Self::fund(w, from, amount))
            .map(|(balance, _)| balance)
    }

    fn fund(world: &mut World, from: Address, amount: U256) -> Result<U256, HostError> {
        world
            .dao
            .treasury_balance()
            .checked_add(&amount)
            .ok_or(GovernanceError::Overflow)?;
        world
            .bank
            .debit(from, amount)
            .map_err(|e| match e {
                TransferError::InsufficientFunds {
                    available,
                    required,
                } => HostError::InsufficientFunds {
                    account: from,
                    available,
                    required,
                },
                other => HostError::Transfer(other),
            })?;
        Ok(world.dao.deposit(from, amount)?)
    }

    /// Move governance tokens between holders.
    pub fn transfer_tokens(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferEvent, HostError> {
        self.commit(|w| Ok(w.token.transfer(from, to, amount)?))
            .map(|(event, _)| event)
    }

    /// Make `address` refuse (or accept again) inbound native transfers.
    pub fn set_inbound_rejected(&self, address: Address, rejected: bool) {
        let mut world = self.world.lock();
        if rejected {
            world.bank.reject_inbound(address);
        } else {
            world.bank.accept_inbound(address);
        }
    }

    /// Live stream of events committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LoggedEvent> {
        self.events_tx.subscribe()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn dao_address(&self) -> Address {
        self.world.lock().dao.address()
    }

    pub fn token_address(&self) -> Address {
        self.world.lock().dao.token()
    }

    pub fn quorum(&self) -> U256 {
        self.world.lock().dao.quorum()
    }

    pub fn proposal_count(&self) -> u64 {
        self.world.lock().dao.proposal_count()
    }

    pub fn proposal(&self, id: u64) -> Result<Proposal, HostError> {
        Ok(self.world.lock().dao.proposal(id)?.clone())
    }

    pub fn proposals(&self) -> Vec<Proposal> {
        self.world.lock().dao.proposals().cloned().collect()
    }

    pub fn voted_for(&self, account: Address, id: u64) -> Result<bool, HostError> {
        Ok(self.world.lock().dao.voted_for(account, id)?)
    }

    pub fn voted_against(&self, account: Address, id: u64) -> Result<bool, HostError> {
        Ok(self.world.lock().dao.voted_against(account, id)?)
    }

    pub fn treasury_balance(&self) -> U256 {
        self.world.lock().dao.treasury_balance()
    }

    pub fn token_balance(&self, holder: Address) -> U256 {
        self.world.lock().token.balance_of(holder)
    }

    pub fn native_balance(&self, account: Address) -> U256 {
        self.world.lock().bank.balance_of(account)
    }

    /// Logged events with `seq >= cursor`.
    pub fn events_since(&self, cursor: u64) -> Vec<LoggedEvent> {
        self.world.lock().dao.events_since(cursor).to_vec()
    }

    /// Borsh snapshot of the governance ledger.
    pub fn snapshot(&self) -> Result<Vec<u8>, HostError> {
        Ok(self.world.lock().dao.snapshot()?)
    }
}
