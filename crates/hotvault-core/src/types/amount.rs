//! Token amounts in the smallest payment unit.
//!
//! Amounts are 256-bit unsigned integers, matching the on-chain `uint256`
//! representation. No floating point is involved in monetary arithmetic.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::units::TOKEN_DECIMALS;

/// A non-negative token amount in base units (18 decimals for USDFC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(U256);

impl TokenAmount {
    /// The zero amount.
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// Wrap a raw `U256` base-unit value.
    pub fn from_u256(value: U256) -> Self {
        Self(value)
    }

    /// Create an amount from a base-unit integer.
    pub fn from_base_units(value: u64) -> Self {
        Self(U256::from(value))
    }

    /// Create an amount from a base-unit `u128`.
    pub fn from_u128(value: u128) -> Self {
        Self(U256::from(value))
    }

    /// Create an amount from whole tokens (`tokens × 10^18`).
    pub fn from_tokens(tokens: u64) -> Self {
        Self(U256::from(tokens).saturating_mul(U256::exp10(TOKEN_DECIMALS as usize)))
    }

    /// The inner `U256` value.
    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Sum, saturating at `U256::MAX`.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Difference, clamped at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Product with a plain integer, saturating at `U256::MAX`.
    pub fn saturating_mul_u64(self, factor: u64) -> Self {
        Self(self.0.saturating_mul(U256::from(factor)))
    }

    /// Lossy conversion to `f64`, for ratios shown to users only.
    pub fn to_f64_lossy(&self) -> f64 {
        u256_to_f64(self.0)
    }

    /// Parse a decimal token string such as `"0.1"` or `"2"` into base units.
    pub fn parse_units(value: &str, decimals: u32) -> AppResult<Self> {
        let value = value.trim();
        let (whole, frac) = match value.split_once('.') {
            Some((w, f)) => (w, f),
            None => (value, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AppError::validation(format!("Invalid token amount '{value}'")));
        }
        if frac.len() > decimals as usize {
            return Err(AppError::validation(format!(
                "Token amount '{value}' has more than {decimals} decimal places"
            )));
        }
        let digits = format!("{}{:0<width$}", whole, frac, width = decimals as usize);
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self::zero());
        }
        U256::from_dec_str(digits)
            .map(Self)
            .map_err(|e| AppError::validation(format!("Invalid token amount '{value}': {e:?}")))
    }

    /// Render the amount in whole tokens with trailing zeros trimmed (`"1.5"`).
    pub fn format_units(&self, decimals: u32) -> String {
        let divisor = U256::exp10(decimals as usize);
        let whole = self.0 / divisor;
        let frac = self.0 % divisor;
        if frac.is_zero() {
            return whole.to_string();
        }
        let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }

    /// Render in whole tokens using the default token decimals.
    pub fn to_token_string(&self) -> String {
        self.format_units(TOKEN_DECIMALS)
    }
}

/// Lossy `U256` → `f64` conversion over the little-endian limbs.
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, limb)| acc + (*limb as f64) * 2f64.powi(64 * i as i32))
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_dec_str(s.trim())
            .map(Self)
            .map_err(|e| AppError::validation(format!("Invalid base-unit amount '{s}': {e:?}")))
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self::from_base_units(value)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(Self::from_base_units(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units_fractional() {
        let fee = TokenAmount::parse_units("0.1", 18).expect("parse");
        assert_eq!(fee.to_string(), "100000000000000000");
    }

    #[test]
    fn test_parse_units_whole() {
        let price = TokenAmount::parse_units("2", 18).expect("parse");
        assert_eq!(price, TokenAmount::from_tokens(2));
    }

    #[test]
    fn test_parse_units_rejects_excess_precision() {
        assert!(TokenAmount::parse_units("0.0000000000000000001", 18).is_err());
        assert!(TokenAmount::parse_units(".", 18).is_err());
        assert!(TokenAmount::parse_units("abc", 18).is_err());
    }

    #[test]
    fn test_format_units_trims() {
        let amount = TokenAmount::from_u128(1_500_000_000_000_000_000);
        assert_eq!(amount.format_units(18), "1.5");
        assert_eq!(TokenAmount::from_tokens(3).format_units(18), "3");
        assert_eq!(TokenAmount::from_base_units(1).format_units(18), "0.000000000000000001");
    }

    #[test]
    fn test_saturating_sub_clamps() {
        let a = TokenAmount::from_base_units(3);
        let b = TokenAmount::from_base_units(5);
        assert!(a.saturating_sub(b).is_zero());
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let amount = TokenAmount::from_tokens(2);
        let json = serde_json::to_string(&amount).expect("serialize");
        assert_eq!(json, "\"2000000000000000000\"");
        let parsed: TokenAmount = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, amount);
        let from_number: TokenAmount = serde_json::from_str("42").expect("deserialize");
        assert_eq!(from_number, TokenAmount::from_base_units(42));
    }

    #[test]
    fn test_to_f64_lossy() {
        let amount = TokenAmount::from_base_units(1 << 40);
        assert_eq!(amount.to_f64_lossy(), (1u64 << 40) as f64);
    }
}
