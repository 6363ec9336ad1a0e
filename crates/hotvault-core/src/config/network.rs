//! Network selection and per-network contract addresses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::Address;

/// Network configuration: the active network and the known contract sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Identifier of the network used when a command does not override it.
    #[serde(default = "default_active")]
    pub active: String,
    /// Contract addresses keyed by network identifier.
    #[serde(default)]
    pub networks: HashMap<String, NetworkEntry>,
}

/// Raw contract configuration for one network, as written in TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkEntry {
    /// EVM chain id.
    #[serde(default)]
    pub chain_id: u64,
    /// JSON-RPC endpoint.
    #[serde(default)]
    pub rpc_url: String,
    /// Payments (escrow) contract.
    #[serde(default)]
    pub payments_address: String,
    /// Storage service contract that is approved as spender.
    #[serde(default)]
    pub storage_service_address: String,
    /// Payment token contract.
    #[serde(default)]
    pub token_address: String,
}

/// Validated contract addresses for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkContracts {
    /// Network identifier these contracts belong to.
    pub network: String,
    /// EVM chain id.
    pub chain_id: u64,
    /// Payments (escrow) contract.
    pub payments: Address,
    /// Storage service contract.
    pub storage_service: Address,
    /// Payment token contract.
    pub token: Address,
}

impl NetworkConfig {
    /// Resolve and validate the contracts for a network.
    ///
    /// Fails with `InvalidNetwork` when the network is unknown or any of
    /// its contract addresses is missing, malformed, or the zero address.
    pub fn resolve(&self, network: &str) -> AppResult<NetworkContracts> {
        let entry = self.networks.get(network).ok_or_else(|| {
            AppError::invalid_network(format!("No contract configuration for network '{network}'"))
        })?;

        let parse = |field: &str, raw: &str| -> AppResult<Address> {
            if raw.trim().is_empty() {
                return Err(AppError::invalid_network(format!(
                    "Network '{network}' has no {field} configured"
                )));
            }
            let address = Address::parse(raw).map_err(|e| {
                AppError::invalid_network(format!("Network '{network}' {field}: {}", e.message))
            })?;
            if address.is_zero() {
                return Err(AppError::invalid_network(format!(
                    "Network '{network}' {field} is the zero address"
                )));
            }
            Ok(address)
        };

        Ok(NetworkContracts {
            network: network.to_string(),
            chain_id: entry.chain_id,
            payments: parse("payments_address", &entry.payments_address)?,
            storage_service: parse("storage_service_address", &entry.storage_service_address)?,
            token: parse("token_address", &entry.token_address)?,
        })
    }

    /// Resolve the active network.
    pub fn resolve_active(&self) -> AppResult<NetworkContracts> {
        self.resolve(&self.active)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            active: default_active(),
            networks: HashMap::new(),
        }
    }
}

fn default_active() -> String {
    "calibration".to_string()
}
