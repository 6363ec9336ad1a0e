//! In-process simulated network.
//!
//! One [`MemoryNetwork`] plays every collaborator at once: payment
//! contracts, transaction watcher, destination registry, and a storage
//! provider. State is shared between clones, so a test can hand clones to
//! the engine and inspect or fault-inject through its own handle.

mod network;
mod payment;
mod provider;
mod registry;

use std::collections::HashMap;

use hotvault_core::config::{NetworkConfig, NetworkContracts, NetworkEntry};
use hotvault_core::types::{Address, ProviderId};

pub use network::{ChainCall, Faults, MemoryNetwork};

/// Identifier of the simulated network.
pub const DEVNET: &str = "devnet";

/// Chain id reported for the simulated network.
pub const DEVNET_CHAIN_ID: u64 = 31_415_926;

/// Provider that serves destinations created on the simulated network.
pub const DEVNET_PROVIDER: ProviderId = ProviderId(1);

fn devnet_address(tag: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xde;
    bytes[1] = 0xf0;
    bytes[19] = tag;
    Address::from_bytes(bytes)
}

/// Paying client wallet on the simulated network.
pub fn devnet_client() -> Address {
    devnet_address(0x01)
}

/// Payee address of [`DEVNET_PROVIDER`].
pub fn devnet_payee() -> Address {
    devnet_address(0x0f)
}

/// Contract addresses of the simulated network.
pub fn devnet_contracts() -> NetworkContracts {
    NetworkContracts {
        network: DEVNET.to_string(),
        chain_id: DEVNET_CHAIN_ID,
        payments: devnet_address(0xa1),
        storage_service: devnet_address(0xa2),
        token: devnet_address(0xa3),
    }
}

/// Network configuration containing only the simulated network.
pub fn devnet_config() -> NetworkConfig {
    let contracts = devnet_contracts();
    let entry = NetworkEntry {
        chain_id: contracts.chain_id,
        rpc_url: "memory://devnet".to_string(),
        payments_address: contracts.payments.to_string(),
        storage_service_address: contracts.storage_service.to_string(),
        token_address: contracts.token.to_string(),
    };
    NetworkConfig {
        active: DEVNET.to_string(),
        networks: HashMap::from([(DEVNET.to_string(), entry)]),
    }
}
