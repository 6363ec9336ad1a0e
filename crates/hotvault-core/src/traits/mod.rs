//! Collaborator contracts consumed by the allowance and upload engine.
//!
//! The chain, payment contracts, destination registry, and storage
//! providers are external; these traits are the only way the engine talks
//! to them. Implementations live in `hotvault-chain`.

pub mod chain;
pub mod payment;
pub mod provider;
pub mod registry;

pub use chain::{TransactionWatcher, TxReceipt, TxStatus};
pub use payment::{EscrowAccount, PaymentService, ServiceApproval};
pub use provider::{ProviderEvent, ProviderEventSender, StorageProviderClient};
pub use registry::{DestinationRecord, DestinationRegistry};
