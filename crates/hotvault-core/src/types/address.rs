//! Hex-encoded chain identifiers: account addresses and transaction hashes.
//!
//! Values are validated on construction and normalized to lowercase so
//! that equality does not depend on checksum casing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Macro to define a validated `0x`-prefixed hex newtype of fixed length.
macro_rules! define_hex {
    (
        $(#[$meta:meta])*
        $name:ident, $bytes:expr, $label:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Number of bytes encoded by this value.
            pub const BYTES: usize = $bytes;

            /// Parse and normalize a hex string.
            pub fn parse(value: &str) -> Result<Self, AppError> {
                let trimmed = value.trim();
                let hex = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .ok_or_else(|| {
                        AppError::validation(format!("{} '{}' must start with 0x", $label, value))
                    })?;
                if hex.len() != $bytes * 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(AppError::validation(format!(
                        "{} '{}' must be {} hex characters",
                        $label,
                        value,
                        $bytes * 2
                    )));
                }
                Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
            }

            /// Encode raw bytes.
            pub fn from_bytes(bytes: [u8; $bytes]) -> Self {
                let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                Self(format!("0x{hex}"))
            }

            /// Return the normalized string form.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0[2..].chars().all(|c| c == '0')
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }
    };
}

define_hex!(
    /// A 20-byte account or contract address.
    Address, 20, "Address"
);

define_hex!(
    /// A 32-byte transaction hash.
    TxHash, 32, "Transaction hash"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalizes_case() {
        let a = Address::parse("0xAbCdEf0123456789aBcDeF0123456789AbCdEf01").expect("parse");
        assert_eq!(a.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(Address::parse("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn test_from_bytes_round_trips() {
        let mut raw = [0u8; 32];
        raw[31] = 0xab;
        let hash = TxHash::from_bytes(raw);
        assert_eq!(TxHash::parse(hash.as_str()).expect("parse"), hash);
        assert!(hash.as_str().ends_with("00ab"));
    }

    #[test]
    fn test_zero_address() {
        let zero = Address::parse(&format!("0x{}", "0".repeat(40))).expect("parse");
        assert!(zero.is_zero());
    }

    #[test]
    fn test_tx_hash_serde() {
        let raw = format!("\"0x{}\"", "ab".repeat(32));
        let hash: TxHash = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(serde_json::to_string(&hash).expect("serialize"), raw);
        assert!(serde_json::from_str::<TxHash>("\"0x12\"").is_err());
    }
}
