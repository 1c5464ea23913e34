use crate::error::TypesError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// 256-bit unsigned integer for token balances, vote tallies and treasury funds.
///
/// Stored as 4 x u64 in little-endian limb order.
/// Arithmetic is checked; callers decide how to surface overflow.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256([u64; 4]);

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..4).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl U256 {
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    pub const ONE: Self = Self([1, 0, 0, 0]);
    pub const MAX: Self = Self([u64::MAX, u64::MAX, u64::MAX, u64::MAX]);

    /// One whole unit at 18 decimals (10^18 base units)
    pub const WEI_PER_UNIT: Self = Self([1_000_000_000_000_000_000, 0, 0, 0]);

    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        Self(limbs)
    }

    pub const fn as_limbs(&self) -> &[u64; 4] {
        &self.0
    }

    pub const fn from_u64(val: u64) -> Self {
        Self([val, 0, 0, 0])
    }

    pub const fn from_u128(val: u128) -> Self {
        Self([val as u64, (val >> 64) as u64, 0, 0])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&l| l == 0)
    }

    /// Checked addition
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        let mut result = [0u64; 4];
        let mut carry = false;

        for (i, limb) in result.iter_mut().enumerate() {
            let (sum, o1) = self.0[i].overflowing_add(rhs.0[i]);
            let (sum, o2) = sum.overflowing_add(carry as u64);
            *limb = sum;
            carry = o1 || o2;
        }

        if carry {
            None
        } else {
            Some(Self(result))
        }
    }

    /// Checked subtraction
    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        if self < rhs {
            return None;
        }

        let mut result = [0u64; 4];
        let mut borrow = false;

        for (i, limb) in result.iter_mut().enumerate() {
            let (diff, u1) = self.0[i].overflowing_sub(rhs.0[i]);
            let (diff, u2) = diff.overflowing_sub(borrow as u64);
            *limb = diff;
            borrow = u1 || u2;
        }

        Some(Self(result))
    }

    /// Checked multiplication by a single limb.
    pub fn checked_mul_u64(&self, rhs: u64) -> Option<Self> {
        let mut result = [0u64; 4];
        let mut carry = 0u128;

        for (i, limb) in result.iter_mut().enumerate() {
            let product = (self.0[i] as u128) * (rhs as u128) + carry;
            *limb = product as u64;
            carry = product >> 64;
        }

        if carry != 0 {
            None
        } else {
            Some(Self(result))
        }
    }

    /// Checked multiplication (schoolbook over limbs)
    pub fn checked_mul(&self, rhs: &Self) -> Option<Self> {
        let mut acc = Self::ZERO;
        for (shift, &limb) in rhs.0.iter().enumerate() {
            if limb == 0 {
                continue;
            }
            let partial = self.checked_mul_u64(limb)?;
            // Shift left by whole limbs; anything pushed past the top overflows.
            let mut shifted = [0u64; 4];
            for i in 0..4 {
                if i + shift < 4 {
                    shifted[i + shift] = partial.0[i];
                } else if partial.0[i] != 0 {
                    return None;
                }
            }
            acc = acc.checked_add(&Self(shifted))?;
        }
        Some(acc)
    }

    /// Divide by a single limb, returning quotient and remainder.
    /// Returns None for a zero divisor.
    pub fn div_rem_u64(&self, rhs: u64) -> Option<(Self, u64)> {
        if rhs == 0 {
            return None;
        }

        let mut quotient = [0u64; 4];
        let mut rem = 0u128;

        for i in (0..4).rev() {
            let cur = (rem << 64) | self.0[i] as u128;
            quotient[i] = (cur / rhs as u128) as u64;
            rem = cur % rhs as u128;
        }

        Some((Self(quotient), rem as u64))
    }

    /// 10^exp, or None past 10^77.
    pub fn checked_pow10(exp: u32) -> Option<Self> {
        let mut result = Self::ONE;
        for _ in 0..exp {
            result = result.checked_mul_u64(10)?;
        }
        Some(result)
    }

    /// Saturating addition
    pub fn saturating_add(&self, rhs: &Self) -> Self {
        self.checked_add(rhs).unwrap_or(Self::MAX)
    }

    /// Saturating subtraction
    pub fn saturating_sub(&self, rhs: &Self) -> Self {
        self.checked_sub(rhs).unwrap_or(Self::ZERO)
    }

    /// Convert to big-endian bytes
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for i in 0..4 {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&self.0[3 - i].to_be_bytes());
        }
        bytes
    }

    /// Convert from big-endian bytes
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for i in 0..4 {
            let mut limb = [0u8; 8];
            limb.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            limbs[3 - i] = u64::from_be_bytes(limb);
        }
        Self(limbs)
    }

    /// Convert to little-endian bytes
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for i in 0..4 {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&self.0[i].to_le_bytes());
        }
        bytes
    }

    /// Convert from little-endian bytes
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *limb = u64::from_le_bytes(raw);
        }
        Self(limbs)
    }

    /// Parse from decimal string
    pub fn from_decimal_str(s: &str) -> Result<Self, TypesError> {
        if s.is_empty() {
            return Err(TypesError::InvalidU256String(s.to_string()));
        }

        let mut result = Self::ZERO;
        for c in s.chars() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| TypesError::InvalidU256String(s.to_string()))?;
            result = result
                .checked_mul_u64(10)
                .and_then(|r| r.checked_add(&Self::from_u64(digit as u64)))
                .ok_or(TypesError::U256Overflow)?;
        }

        Ok(result)
    }
}

impl From<u64> for U256 {
    fn from(val: u64) -> Self {
        Self::from_u64(val)
    }
}

impl From<u32> for U256 {
    fn from(val: u32) -> Self {
        Self::from_u64(val as u64)
    }
}

impl From<u128> for U256 {
    fn from(val: u128) -> Self {
        Self::from_u128(val)
    }
}

impl TryFrom<U256> for u128 {
    type Error = TypesError;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        if value.0[2] != 0 || value.0[3] != 0 {
            Err(TypesError::U256Overflow)
        } else {
            Ok((value.0[1] as u128) << 64 | value.0[0] as u128)
        }
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.pad("0");
        }

        let mut n = *self;
        let mut digits = Vec::with_capacity(78);
        while !n.is_zero() {
            let Some((q, r)) = n.div_rem_u64(10) else {
                return Err(fmt::Error);
            };
            digits.push(b'0' + r as u8);
            n = q;
        }
        digits.reverse();

        // Digits are ASCII by construction.
        f.pad(std::str::from_utf8(&digits).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({})", self)
    }
}

impl fmt::LowerHex for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_be_bytes()))
    }
}

impl FromStr for U256 {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(digits) => {
                let digits = if digits.len() % 2 == 1 {
                    format!("0{}", digits)
                } else {
                    digits.to_string()
                };
                let bytes = hex::decode(&digits)?;
                if bytes.len() > 32 {
                    return Err(TypesError::U256Overflow);
                }
                let mut padded = [0u8; 32];
                padded[32 - bytes.len()..].copy_from_slice(&bytes);
                Ok(Self::from_be_bytes(padded))
            }
            None => Self::from_decimal_str(s),
        }
    }
}
