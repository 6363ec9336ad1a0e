//! Connection context threaded through every operation.

use std::sync::Arc;

use hotvault_core::config::{
    AppConfig, NetworkConfig, NetworkContracts, PriceTable, StorageConfig, UploadConfig,
};
use hotvault_core::result::AppResult;
use hotvault_core::traits::{
    DestinationRegistry, PaymentService, StorageProviderClient, TransactionWatcher,
};
use hotvault_core::types::Address;
use hotvault_payment::{BalanceFetcher, PreflightGate, StorageMetricsCalculator};

use crate::destination::DestinationSelector;

/// The external collaborators one context talks to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Payment contracts.
    pub payments: Arc<dyn PaymentService>,
    /// Transaction receipts.
    pub watcher: Arc<dyn TransactionWatcher>,
    /// Destination registry.
    pub registry: Arc<dyn DestinationRegistry>,
    /// Storage provider.
    pub provider: Arc<dyn StorageProviderClient>,
}

impl Collaborators {
    /// Use one value for every collaborator.
    pub fn shared<T>(backend: T) -> Self
    where
        T: PaymentService + TransactionWatcher + DestinationRegistry + StorageProviderClient,
    {
        let backend = Arc::new(backend);
        Self {
            payments: backend.clone(),
            watcher: backend.clone(),
            registry: backend.clone(),
            provider: backend,
        }
    }
}

/// Collaborators, contracts, and settings for one client on one network.
///
/// Nothing here is process-global: every service receives the context it
/// operates on.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Paying client.
    pub client: Address,
    /// Contracts of the network in use.
    pub contracts: NetworkContracts,
    /// All configured networks.
    pub networks: NetworkConfig,
    /// Prices in base units.
    pub prices: PriceTable,
    /// Default storage intent.
    pub storage: StorageConfig,
    /// Upload settings.
    pub upload: UploadConfig,
    /// External collaborators.
    pub collaborators: Collaborators,
}

impl ServiceContext {
    /// Build a context for the configured active network.
    pub fn new(config: &AppConfig, client: Address, collaborators: Collaborators) -> AppResult<Self> {
        Self::for_network(config, &config.network.active, client, collaborators)
    }

    /// Build a context for `network`, failing with `InvalidNetwork` if it is unknown.
    pub fn for_network(
        config: &AppConfig,
        network: &str,
        client: Address,
        collaborators: Collaborators,
    ) -> AppResult<Self> {
        Ok(Self {
            client,
            contracts: config.network.resolve(network)?,
            networks: config.network.clone(),
            prices: config.pricing.price_table()?,
            storage: config.storage.clone(),
            upload: config.upload.clone(),
            collaborators,
        })
    }

    /// Identifier of the network in use.
    pub fn network(&self) -> &str {
        &self.contracts.network
    }

    /// Balance fetcher over this context's payment service.
    pub fn balance_fetcher(&self) -> BalanceFetcher {
        BalanceFetcher::new(self.collaborators.payments.clone(), self.networks.clone())
    }

    /// Metrics calculator for this context's prices.
    pub fn metrics(&self) -> StorageMetricsCalculator {
        StorageMetricsCalculator::new(self.prices)
    }

    /// Preflight gate for this context's network.
    pub fn preflight(&self) -> PreflightGate {
        PreflightGate::new(
            self.collaborators.payments.clone(),
            self.collaborators.watcher.clone(),
            self.contracts.clone(),
        )
    }

    /// Destination selector over this context's registry.
    pub fn selector(&self) -> DestinationSelector {
        DestinationSelector::new(self.collaborators.registry.clone())
    }
}
