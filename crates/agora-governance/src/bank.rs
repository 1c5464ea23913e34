//! In-memory native-currency accounts.
//!
//! Stands in for the host chain's account balances: funders pay into the
//! treasury from here and proposal recipients are paid out into it.

use agora_types::{Address, NativeAlloc, U256};
use borsh::{BorshDeserialize, BorshSerialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::treasury::{FundsTransfer, TransferError};

/// Native-currency balances.
#[derive(Debug, Default, Clone, BorshSerialize, BorshDeserialize)]
pub struct NativeBank {
    balances: HashMap<Address, U256>,
    /// Accounts whose receive hook refuses inbound funds
    rejecting: HashSet<Address>,
}

impl NativeBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed balances from genesis allocations. Repeated addresses accumulate.
    pub fn from_allocs(allocs: &[NativeAlloc]) -> Result<Self, TransferError> {
        let mut bank = Self::new();
        for alloc in allocs {
            bank.credit(alloc.address, alloc.balance)?;
        }
        Ok(bank)
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or(U256::ZERO)
    }

    /// Add funds to an account.
    pub fn credit(&mut self, to: Address, amount: U256) -> Result<U256, TransferError> {
        let balance = self
            .balance_of(to)
            .checked_add(&amount)
            .ok_or(TransferError::Overflow)?;
        self.balances.insert(to, balance);
        Ok(balance)
    }

    /// Remove funds from an account, returning the new balance.
    pub fn debit(&mut self, from: Address, amount: U256) -> Result<U256, TransferError> {
        let available = self.balance_of(from);
        let balance = available
            .checked_sub(&amount)
            .ok_or(TransferError::InsufficientFunds { available, required: amount })?;
        self.balances.insert(from, balance);
        Ok(balance)
    }

    /// Make `address` refuse every inbound transfer.
    pub fn reject_inbound(&mut self, address: Address) {
        self.rejecting.insert(address);
    }

    /// Accept inbound transfers to `address` again.
    pub fn accept_inbound(&mut self, address: Address) {
        self.rejecting.remove(&address);
    }
}

impl FundsTransfer for NativeBank {
    fn transfer(&mut self, to: Address, amount: U256) -> Result<(), TransferError> {
        if self.rejecting.contains(&to) {
            debug!(%to, %amount, "inbound transfer refused");
            return Err(TransferError::Rejected(to));
        }
        self.credit(to, amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::ether;

    #[test]
    fn test_from_allocs() {
        let a = Address::derive("a");
        let bank =
            NativeBank::from_allocs(&[NativeAlloc { address: a, balance: ether(10_000) }]).unwrap();
        assert_eq!(bank.balance_of(a), ether(10_000));
        assert_eq!(bank.balance_of(Address::derive("b")), U256::ZERO);
    }

    #[test]
    fn test_from_allocs_sums_repeated_addresses() {
        let a = Address::derive("a");
        let bank = NativeBank::from_allocs(&[
            NativeAlloc { address: a, balance: ether(3) },
            NativeAlloc { address: a, balance: ether(4) },
        ])
        .unwrap();
        assert_eq!(bank.balance_of(a), ether(7));

        let overflow = NativeBank::from_allocs(&[
            NativeAlloc { address: a, balance: U256::MAX },
            NativeAlloc { address: a, balance: U256::ONE },
        ]);
        assert_eq!(overflow.unwrap_err(), TransferError::Overflow);
    }

    #[test]
    fn test_debit_shortfall() {
        let mut bank = NativeBank::new();
        let a = Address::derive("a");
        bank.credit(a, ether(5)).unwrap();

        assert_eq!(
            bank.debit(a, ether(6)),
            Err(TransferError::InsufficientFunds {
                available: ether(5),
                required: ether(6),
            })
        );
        assert_eq!(bank.balance_of(a), ether(5));
        assert_eq!(bank.debit(a, ether(2)), Ok(ether(3)));
    }

    #[test]
    fn test_rejecting_recipient() {
        let mut bank = NativeBank::new();
        let a = Address::derive("a");
        bank.reject_inbound(a);

        assert_eq!(bank.transfer(a, ether(1)), Err(TransferError::Rejected(a)));
        assert_eq!(bank.balance_of(a), U256::ZERO);

        bank.accept_inbound(a);
        bank.transfer(a, ether(1)).unwrap();
        assert_eq!(bank.balance_of(a), ether(1));
    }
}
