//! Balance fetcher: one concurrent pass over the payment contracts.

use std::sync::Arc;

use tracing::{info, warn};

use hotvault_core::config::{NetworkConfig, NetworkContracts};
use hotvault_core::error::{AppError, ErrorKind};
use hotvault_core::result::AppResult;
use hotvault_core::traits::PaymentService;
use hotvault_core::types::Address;
use hotvault_entity::{AllowanceSnapshot, BalanceSheet};

/// Reads allowance, usage, and balances for a client.
#[derive(Debug, Clone)]
pub struct BalanceFetcher {
    /// Payment service used for reads.
    payments: Arc<dyn PaymentService>,
    /// Known networks and their contracts.
    networks: NetworkConfig,
}

impl BalanceFetcher {
    /// Creates a new balance fetcher.
    pub fn new(payments: Arc<dyn PaymentService>, networks: NetworkConfig) -> Self {
        Self { payments, networks }
    }

    /// Resolve the contracts of `network`, failing before any read is issued.
    pub fn contracts(&self, network: &str) -> AppResult<NetworkContracts> {
        self.networks.resolve(network)
    }

    /// Read the allowance snapshot for `client`, scaled to `capacity_bytes`.
    pub async fn fetch_snapshot(
        &self,
        client: &Address,
        network: &str,
        capacity_bytes: u64,
        with_cdn: bool,
    ) -> AppResult<AllowanceSnapshot> {
        let contracts = self.contracts(network)?;

        let (approval, needed) = tokio::try_join!(
            self.read(
                "service approval",
                self.payments
                    .service_approval(client, &contracts.storage_service)
            ),
            self.read(
                "rate allowance needed",
                self.payments.rate_allowance_needed(capacity_bytes, with_cdn)
            ),
        )?;

        Ok(AllowanceSnapshot::from_approval(&approval, needed))
    }

    /// Read the full balance sheet for `client`.
    pub async fn fetch(
        &self,
        client: &Address,
        network: &str,
        capacity_bytes: u64,
        with_cdn: bool,
    ) -> AppResult<BalanceSheet> {
        let contracts = self.contracts(network)?;

        let (approval, needed, wallet_balance, escrow) = tokio::try_join!(
            self.read(
                "service approval",
                self.payments
                    .service_approval(client, &contracts.storage_service)
            ),
            self.read(
                "rate allowance needed",
                self.payments.rate_allowance_needed(capacity_bytes, with_cdn)
            ),
            self.read(
                "wallet balance",
                self.payments.wallet_balance(&contracts.token, client)
            ),
            self.read(
                "escrow account",
                self.payments.escrow_account(&contracts.token, client)
            ),
        )?;

        info!(
            client = %client,
            network = %network,
            wallet = %wallet_balance.to_token_string(),
            escrow_available = %escrow.available_funds.to_token_string(),
            service_approved = approval.is_approved,
            "Fetched balances"
        );

        Ok(BalanceSheet {
            network: network.to_string(),
            snapshot: AllowanceSnapshot::from_approval(&approval, needed),
            service_approved: approval.is_approved,
            wallet_balance,
            escrow,
        })
    }

    async fn read<T>(
        &self,
        what: &str,
        call: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        call.await.map_err(|e| {
            warn!(read = what, error = %e, "Balance read failed");
            upstream(what, e)
        })
    }
}

/// Map a collaborator failure to `UpstreamUnavailable`, keeping caller errors as-is.
fn upstream(what: &str, err: AppError) -> AppError {
    match err.kind {
        ErrorKind::InvalidNetwork | ErrorKind::Validation => err,
        _ => AppError::wrap(
            ErrorKind::UpstreamUnavailable,
            format!("Could not read {what}"),
            err,
        ),
    }
}
