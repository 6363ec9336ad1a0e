//! Core type definitions used across the HotVault workspace.

pub mod address;
pub mod amount;
pub mod id;
pub mod units;

pub use address::{Address, TxHash};
pub use amount::TokenAmount;
pub use id::{DestinationId, PieceCid, ProviderId, RootId, SessionId};
