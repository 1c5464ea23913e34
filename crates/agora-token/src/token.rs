//! Capped fungible token.
//!
//! Standard transfer / approve / transfer_from interface over 18-decimal
//! balances. Invariant: sum of balances == total_supply <= max_supply.

use agora_types::{Address, U256, DECIMALS};
use borsh::{BorshDeserialize, BorshSerialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::TokenError;

/// Token state
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct Token {
    /// Address the token was deployed at
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Hard cap in base units
    pub max_supply: U256,
    pub total_supply: U256,
    /// Holder -> balance, zero balances are not stored
    balances: HashMap<Address, U256>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), U256>,
}

/// Transfer event
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Approval event
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
}

impl Token {
    /// Deploy a token at `address` and mint `max_supply` whole tokens to `deployer`.
    pub fn deploy(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        max_supply: u64,
        deployer: Address,
    ) -> Result<(Self, TransferEvent), TokenError> {
        if deployer.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let cap = U256::from(max_supply)
            .checked_mul(&U256::WEI_PER_UNIT)
            .ok_or(TokenError::SupplyCapExceeded)?;

        let mut token = Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            decimals: DECIMALS as u8,
            max_supply: cap,
            total_supply: U256::ZERO,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        };
        let minted = token.mint(deployer, cap)?;

        debug!(token = %token.address, symbol = %token.symbol, supply = %cap, "token deployed");
        Ok((token, minted))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn max_supply(&self) -> U256 {
        self.max_supply
    }

    /// Get balance of address
    pub fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or(U256::ZERO)
    }

    /// Get allowance
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Number of addresses holding a positive balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Transfer tokens
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<TransferEvent, TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        self.move_balance(from, to, value)?;
        debug!(%from, %to, %value, "token transfer");

        Ok(TransferEvent { from, to, value })
    }

    /// Approve spender
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<ApprovalEvent, TokenError> {
        if spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        if value.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), value);
        }

        Ok(ApprovalEvent { owner, spender, value })
    }

    /// Transfer from (with allowance)
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<TransferEvent, TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let available = self.allowance(from, spender);
        let remaining = available
            .checked_sub(&value)
            .ok_or(TokenError::InsufficientAllowance { available, required: value })?;

        // Move first so a failed transfer leaves the allowance untouched.
        self.move_balance(from, to, value)?;
        self.approve(from, spender, remaining)?;

        Ok(TransferEvent { from, to, value })
    }

    fn mint(&mut self, to: Address, value: U256) -> Result<TransferEvent, TokenError> {
        let new_supply = self
            .total_supply
            .checked_add(&value)
            .filter(|s| *s <= self.max_supply)
            .ok_or(TokenError::SupplyCapExceeded)?;

        let new_balance = self
            .balance_of(to)
            .checked_add(&value)
            .ok_or(TokenError::SupplyCapExceeded)?;

        self.total_supply = new_supply;
        self.set_balance(to, new_balance);

        Ok(TransferEvent {
            from: Address::ZERO,
            to,
            value,
        })
    }

    /// Zero-value moves are allowed and change nothing.
    fn move_balance(&mut self, from: Address, to: Address, value: U256) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        let from_balance = available
            .checked_sub(&value)
            .ok_or(TokenError::InsufficientBalance { available, required: value })?;
        self.set_balance(from, from_balance);

        // Supply is capped, so a recipient balance cannot overflow.
        let to_balance = self.balance_of(to).saturating_add(&value);
        self.set_balance(to, to_balance);

        Ok(())
    }

    fn set_balance(&mut self, holder: Address, balance: U256) {
        if balance.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }
}
