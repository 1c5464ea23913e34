use agora_types::U256;
use thiserror::Error;

/// Errors that can occur in token operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenError {
    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: U256, required: U256 },

    #[error("Insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance { available: U256, required: U256 },

    #[error("Zero address not allowed")]
    ZeroAddress,

    #[error("Supply cap exceeded")]
    SupplyCapExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TokenError::InsufficientBalance {
            available: U256::from(1u64),
            required: U256::from(2u64),
        };
        assert!(err.to_string().contains("have 1, need 2"));
    }
}
