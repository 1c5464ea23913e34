//! Agora Types - Core type definitions for the Agora governance ledger.
//!
//! This crate provides the fundamental types shared by the token, the
//! governance ledger and the command-line runner:
//! - Addresses (20-byte, `0x` hex encoded)
//! - U256 (256-bit unsigned integer for balances, tallies and quorum)
//! - Unit helpers (`ether`, `tokens`, 18-decimal formatting)
//! - Genesis configuration for a DAO deployment

pub mod address;
pub mod u256;
pub mod units;
pub mod genesis;
pub mod error;

#[cfg(any(feature = "serde", feature = "borsh"))]
mod serialization;

pub use address::Address;
pub use u256::U256;
pub use units::{ether, format_units, parse_units, tokens, DECIMALS};
pub use genesis::{GenesisConfig, NativeAlloc, TokenAlloc, TokenParams, TreasuryFunding};
pub use error::TypesError;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{ether, tokens, Address, GenesisConfig, TypesError, U256};
}
