//! Treasury accounting for governance funds.
//!
//! The treasury only grows through deposits and only shrinks through
//! finalized proposals. Payouts go through a `FundsTransfer` so the ledger
//! never has to know how native currency actually moves.

use agora_types::{Address, U256};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GovernanceError;

/// Why a payout could not be delivered.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransferError {
    #[error("recipient {0} rejected the transfer")]
    Rejected(Address),

    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: U256, required: U256 },

    #[error("recipient balance overflow")]
    Overflow,
}

/// Primitive that moves native currency out of the treasury.
pub trait FundsTransfer {
    /// Deliver `amount` to `to`. Must not apply any effect when it fails.
    fn transfer(&mut self, to: Address, amount: U256) -> Result<(), TransferError>;
}

/// Kind of treasury movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum TreasuryEntryKind {
    Deposit,
    Disbursement,
}

/// Treasury history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TreasuryEntry {
    pub kind: TreasuryEntryKind,
    pub amount: U256,
    /// Depositor or payout recipient
    pub counterparty: Address,
    /// Proposal that triggered a disbursement
    pub proposal_id: Option<u64>,
}

/// Treasury balance and history.
#[derive(Debug, Default, Clone, BorshSerialize, BorshDeserialize)]
pub struct Treasury {
    balance: U256,
    history: Vec<TreasuryEntry>,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> U256 {
        self.balance
    }

    pub fn history(&self) -> &[TreasuryEntry] {
        &self.history
    }

    /// Accept funds. Deposits are unconditional apart from overflow.
    pub fn deposit(&mut self, from: Address, amount: U256) -> Result<U256, GovernanceError> {
        self.balance = self
            .balance
            .checked_add(&amount)
            .ok_or(GovernanceError::Overflow)?;

        if !amount.is_zero() {
            self.history.push(TreasuryEntry {
                kind: TreasuryEntryKind::Deposit,
                amount,
                counterparty: from,
                proposal_id: None,
            });
        }

        Ok(self.balance)
    }

    /// Pay `amount` to `to` on behalf of proposal `proposal_id`.
    ///
    /// The balance is only debited after `funds` reports success, so a failed
    /// delivery leaves the treasury exactly as it was.
    pub fn disburse<F: FundsTransfer + ?Sized>(
        &mut self,
        funds: &mut F,
        proposal_id: u64,
        to: Address,
        amount: U256,
    ) -> Result<(), GovernanceError> {
        let remaining = self.balance.checked_sub(&amount).ok_or_else(|| {
            GovernanceError::TransferFailed(format!(
                "treasury holds {}, payout needs {}",
                self.balance, amount
            ))
        })?;

        funds
            .transfer(to, amount)
            .map_err(|e| GovernanceError::TransferFailed(e.to_string()))?;

        self.balance = remaining;
        self.history.push(TreasuryEntry {
            kind: TreasuryEntryKind::Disbursement,
            amount,
            counterparty: to,
            proposal_id: Some(proposal_id),
        });

        Ok(())
    }
}
