//! # hotvault-chain
//!
//! Implementations of the collaborator traits defined in
//! `hotvault_core::traits`:
//!
//! - [`memory::MemoryNetwork`] simulates the payment contracts, destination
//!   registry, transaction watcher, and a storage provider in-process. It
//!   backs the test suites and the CLI's `--simulate` mode.
//! - [`gateway::GatewayClient`] (feature `gateway`) talks typed JSON to an
//!   HTTP bridge in front of the real chain SDK.

pub mod memory;

#[cfg(feature = "gateway")]
pub mod gateway;

pub use memory::MemoryNetwork;

#[cfg(feature = "gateway")]
pub use gateway::GatewayClient;
