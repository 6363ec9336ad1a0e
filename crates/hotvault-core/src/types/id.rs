//! Identifier newtypes for sessions, destinations, providers, roots, and pieces.
//!
//! Using distinct types prevents accidentally passing a `ProviderId` where a
//! `DestinationId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Macro to define a newtype ID wrapper around an on-chain `u64` counter.
macro_rules! define_chain_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the inner value.
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_chain_id!(
    /// Identifier of a storage destination (dataset / proof set).
    DestinationId
);

define_chain_id!(
    /// Identifier of a storage provider in the provider registry.
    ProviderId
);

define_chain_id!(
    /// Identifier of a root (piece) within a destination.
    RootId
);

/// Unique identifier of one upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content identifier (piece commitment) returned after a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PieceCid(String);

impl PieceCid {
    /// Validate a piece CID string.
    ///
    /// Only structural checks are applied; the CID is opaque to this crate.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let value = value.trim();
        if value.len() < 8 || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::validation(format!(
                "Piece CID '{value}' is not a valid CID string"
            )));
        }
        Ok(Self(value.to_string()))
    }

    /// Return the CID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PieceCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PieceCid {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PieceCid> for String {
    fn from(value: PieceCid) -> String {
        value.0
    }
}
