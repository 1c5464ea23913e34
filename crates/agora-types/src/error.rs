use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address length: expected 20, got {0}")]
    InvalidAddressLength(usize),

    #[error("U256 overflow")]
    U256Overflow,

    #[error("Invalid U256 string: {0}")]
    InvalidU256String(String),

    #[error("Invalid amount '{0}': {1}")]
    InvalidAmount(String, String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),
}

impl From<hex::FromHexError> for TypesError {
    fn from(e: hex::FromHexError) -> Self {
        TypesError::InvalidHex(e.to_string())
    }
}
