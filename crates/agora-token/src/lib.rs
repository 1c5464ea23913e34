//! Agora Token - the fungible token whose balances are voting weights.
//!
//! The full capped supply is minted to the deployer at deployment and
//! distributed from there with ordinary transfers.

pub mod token;
pub mod error;

pub use token::{ApprovalEvent, Token, TransferEvent};
pub use error::TokenError;

use agora_types::{Address, U256};

/// Read-only view of token balances.
///
/// The governance ledger only ever asks one question of the token:
/// how much does this holder own right now.
pub trait BalanceOracle {
    fn balance_of(&self, holder: Address) -> U256;
}

impl BalanceOracle for Token {
    fn balance_of(&self, holder: Address) -> U256 {
        Token::balance_of(self, holder)
    }
}

impl<T: BalanceOracle + ?Sized> BalanceOracle for &T {
    fn balance_of(&self, holder: Address) -> U256 {
        (**self).balance_of(holder)
    }
}
