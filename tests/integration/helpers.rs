//! Shared test helpers for integration tests.

use hotvault_chain::memory::{ChainCall, MemoryNetwork, devnet_config};
use hotvault_core::config::AppConfig;
use hotvault_core::events::UploadProgress;
use hotvault_core::types::TokenAmount;
use hotvault_entity::{StorageRequest, SufficiencyReport, UploadSession};
use hotvault_service::{Collaborators, ServiceContext, UploadOrchestrator, UploadRequest};

/// Test application over an in-memory network
pub struct TestApp {
    /// Handle on the simulated chain, provider, and registry
    pub network: MemoryNetwork,
    /// Application config
    pub config: AppConfig,
    /// Context the services run against
    pub ctx: ServiceContext,
}

impl TestApp {
    /// Create an app whose wallet holds 10 tokens
    pub fn new() -> Self {
        let app = Self::unfunded();
        app.network.fund_wallet(TokenAmount::from_tokens(10));
        app
    }

    /// Create an app with an empty wallet
    pub fn unfunded() -> Self {
        let config = AppConfig {
            network: devnet_config(),
            ..AppConfig::default()
        };
        let network = MemoryNetwork::with_prices(config.pricing.price_table().expect("prices"));
        let ctx = ServiceContext::new(
            &config,
            network.client(),
            Collaborators::shared(network.clone()),
        )
        .expect("context");
        Self {
            network,
            config,
            ctx,
        }
    }

    /// Storage request for the configured defaults
    pub fn default_request(&self) -> StorageRequest {
        StorageRequest::from_config(&self.config.storage).expect("request")
    }

    /// Read the snapshot and compute a report for `request`
    pub async fn report(&self, request: &StorageRequest) -> SufficiencyReport {
        let snapshot = self
            .ctx
            .balance_fetcher()
            .fetch_snapshot(
                &self.ctx.client,
                self.ctx.network(),
                request.capacity_bytes,
                request.use_cdn,
            )
            .await
            .expect("snapshot");
        self.ctx.metrics().compute_metrics(request, &snapshot)
    }

    /// Start an upload and collect every progress event until it ends
    pub async fn upload(&self, size: usize, use_cdn: bool) -> (UploadSession, Vec<UploadProgress>) {
        let request = UploadRequest::new("report.pdf", vec![7u8; size], use_cdn);
        let mut handle = UploadOrchestrator::new(self.ctx.clone()).start(request);
        let mut events = Vec::new();
        while let Some(event) = handle.next_progress().await {
            events.push(event);
        }
        let session = handle.finish().await.expect("session");
        assert!(session.is_finished(), "session ended in {}", session.stage);
        (session, events)
    }

    /// Amounts of every deposit submitted so far
    pub fn deposits(&self) -> Vec<TokenAmount> {
        self.network
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                ChainCall::Deposit(amount) => Some(amount),
                _ => None,
            })
            .collect()
    }

    /// Number of destination creations submitted so far
    pub fn creations(&self) -> usize {
        self.network
            .calls()
            .iter()
            .filter(|c| matches!(c, ChainCall::CreateDestination { .. }))
            .count()
    }
}
