//! Unit scaling for 18-decimal amounts.
//!
//! Token balances and native funds are both denominated in base units with
//! 18 decimals, so `ether(100)` and `tokens(100)` are the same value.

use crate::error::TypesError;
use crate::u256::U256;

/// Decimals used by the governance token and the native currency.
pub const DECIMALS: u32 = 18;

/// `n` whole units of native currency, in base units.
pub fn ether(n: u64) -> U256 {
    // u64::MAX * 10^18 < 2^128, so this cannot overflow.
    U256::from(n as u128 * 1_000_000_000_000_000_000u128)
}

/// `n` whole governance tokens, in base units.
pub fn tokens(n: u64) -> U256 {
    ether(n)
}

/// Format a base-unit amount as a decimal string with `decimals` places,
/// trimming trailing zeros but keeping at least one fractional digit.
pub fn format_units(value: &U256, decimals: u32) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };

    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Parse a decimal string such as `"100"` or `"0.25"` into base units.
pub fn parse_units(s: &str, decimals: u32) -> Result<U256, TypesError> {
    let invalid = |why: &str| TypesError::InvalidAmount(s.to_string(), why.to_string());

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("empty"));
    }
    if frac.len() > decimals as usize {
        return Err(invalid("too many decimal places"));
    }

    let scale = U256::checked_pow10(decimals).ok_or(TypesError::U256Overflow)?;
    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_decimal_str(whole).map_err(|_| invalid("not a number"))?
    };

    let frac_value = if frac.is_empty() {
        U256::ZERO
    } else {
        let digits = U256::from_decimal_str(frac).map_err(|_| invalid("not a number"))?;
        let pad = U256::checked_pow10(decimals - frac.len() as u32).ok_or(TypesError::U256Overflow)?;
        digits.checked_mul(&pad).ok_or(TypesError::U256Overflow)?
    };

    whole
        .checked_mul(&scale)
        .and_then(|w| w.checked_add(&frac_value))
        .ok_or(TypesError::U256Overflow)
}
