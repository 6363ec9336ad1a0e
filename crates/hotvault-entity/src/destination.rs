//! Storage destinations (datasets / proof sets).

use serde::{Deserialize, Serialize};

use hotvault_core::traits::registry::DestinationRecord;
use hotvault_core::types::{Address, DestinationId, ProviderId};

/// An existing append target bound to one provider.
///
/// `current_piece_count` never decreases over the destination's life.
/// `provider_id` is resolved lazily and stays `None` if the lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDestination {
    /// On-chain identifier.
    pub id: DestinationId,
    /// Provider address receiving payment.
    pub payee_address: Address,
    /// Whether the destination is CDN-backed.
    pub with_cdn: bool,
    /// Number of roots registered so far.
    pub current_piece_count: u64,
    /// Provider serving the destination, once resolved.
    pub provider_id: Option<ProviderId>,
}

impl StorageDestination {
    /// Return a copy with the provider id set.
    pub fn with_provider(mut self, provider_id: Option<ProviderId>) -> Self {
        self.provider_id = provider_id;
        self
    }
}

impl From<DestinationRecord> for StorageDestination {
    fn from(record: DestinationRecord) -> Self {
        Self {
            id: record.id,
            payee_address: record.payee,
            with_cdn: record.with_cdn,
            current_piece_count: record.current_piece_count,
            provider_id: None,
        }
    }
}
