//! Destination (dataset / proof set) registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::{Address, DestinationId, ProviderId, TxHash};

/// A destination as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRecord {
    /// On-chain identifier.
    pub id: DestinationId,
    /// Provider address that receives payment.
    pub payee: Address,
    /// Whether the destination is CDN-backed.
    pub with_cdn: bool,
    /// Number of roots registered so far.
    pub current_piece_count: u64,
}

/// Registry of a client's storage destinations.
#[async_trait]
pub trait DestinationRegistry: Send + Sync + std::fmt::Debug + 'static {
    /// All destinations owned by `client`.
    async fn list_client_destinations(&self, client: &Address) -> AppResult<Vec<DestinationRecord>>;

    /// Look up the provider serving a destination.
    async fn resolve_provider_id(&self, destination: DestinationId) -> AppResult<Option<ProviderId>>;

    /// Submit a destination-creation transaction.
    async fn create_destination(&self, client: &Address, with_cdn: bool) -> AppResult<TxHash>;

    /// Wait for a creation transaction to be mined and return the new destination.
    async fn confirm_destination(&self, tx: &TxHash) -> AppResult<DestinationRecord>;
}
