//! Dataset selector.
//!
//! Appends are concentrated on the most-used destination of the requested
//! CDN mode, so creation costs are amortized over more data.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use hotvault_core::error::{AppError, ErrorKind};
use hotvault_core::result::AppResult;
use hotvault_core::traits::DestinationRegistry;
use hotvault_core::types::{Address, DestinationId, ProviderId};
use hotvault_entity::StorageDestination;

/// Pick the destination to append to.
///
/// Only candidates whose CDN mode matches `use_cdn` are considered; among
/// them the highest `current_piece_count` wins, ties going to the first
/// one seen. `None` means a new destination must be created.
pub fn select_destination(
    candidates: &[StorageDestination],
    use_cdn: bool,
) -> Option<&StorageDestination> {
    candidates
        .iter()
        .filter(|d| d.with_cdn == use_cdn)
        .fold(None::<&StorageDestination>, |best, candidate| match best {
            Some(b) if b.current_piece_count >= candidate.current_piece_count => Some(b),
            _ => Some(candidate),
        })
}

/// Reads destinations from the registry and applies [`select_destination`].
#[derive(Debug, Clone)]
pub struct DestinationSelector {
    registry: Arc<dyn DestinationRegistry>,
}

impl DestinationSelector {
    /// Creates a selector over `registry`.
    pub fn new(registry: Arc<dyn DestinationRegistry>) -> Self {
        Self { registry }
    }

    /// All of `client`'s destinations, without provider ids.
    pub async fn list(&self, client: &Address) -> AppResult<Vec<StorageDestination>> {
        let records = self
            .registry
            .list_client_destinations(client)
            .await
            .map_err(|e| {
                AppError::wrap(
                    ErrorKind::UpstreamUnavailable,
                    "Could not list destinations",
                    e,
                )
            })?;
        Ok(records.into_iter().map(StorageDestination::from).collect())
    }

    /// All of `client`'s destinations with provider ids looked up concurrently.
    pub async fn list_with_providers(&self, client: &Address) -> AppResult<Vec<StorageDestination>> {
        let destinations = self.list(client).await?;
        let lookups = destinations.iter().map(|d| self.provider_of(d.id));
        let providers = join_all(lookups).await;
        Ok(destinations
            .into_iter()
            .zip(providers)
            .map(|(d, provider)| d.with_provider(provider))
            .collect())
    }

    /// The destination to append to for `use_cdn`, if any exists.
    pub async fn resolve(
        &self,
        client: &Address,
        use_cdn: bool,
    ) -> AppResult<Option<StorageDestination>> {
        let destinations = self.list(client).await?;
        let Some(selected) = select_destination(&destinations, use_cdn).cloned() else {
            debug!(client = %client, use_cdn, "No matching destination, one will be created");
            return Ok(None);
        };
        let provider = self.provider_of(selected.id).await;
        debug!(
            destination_id = %selected.id,
            pieces = selected.current_piece_count,
            provider_id = ?provider,
            "Selected destination"
        );
        Ok(Some(selected.with_provider(provider)))
    }

    /// Provider lookup; a failure only loses the id.
    async fn provider_of(&self, destination: DestinationId) -> Option<ProviderId> {
        match self.registry.resolve_provider_id(destination).await {
            Ok(provider) => provider,
            Err(e) => {
                warn!(
                    destination_id = %destination,
                    error = %e,
                    "Provider lookup failed, continuing without provider id"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotvault_chain::memory::{MemoryNetwork, devnet_payee};

    fn destination(id: u64, with_cdn: bool, pieces: u64) -> StorageDestination {
        StorageDestination {
            id: DestinationId(id),
            payee_address: devnet_payee(),
            with_cdn,
            current_piece_count: pieces,
            provider_id: None,
        }
    }

    #[test]
    fn test_empty_selects_none() {
        assert!(select_destination(&[], false).is_none());
        assert!(select_destination(&[], true).is_none());
    }

    #[test]
    fn test_mode_beats_piece_count() {
        let candidates = [destination(1, true, 5), destination(2, false, 50)];
        assert_eq!(
            select_destination(&candidates, false).map(|d| d.id),
            Some(DestinationId(2))
        );
        let candidates = [destination(1, true, 5), destination(2, false, 50)];
        assert_eq!(
            select_destination(&candidates, true).map(|d| d.id),
            Some(DestinationId(1))
        );
    }

    #[test]
    fn test_most_pieces_first_seen_on_tie() {
        let candidates = [
            destination(1, false, 3),
            destination(2, false, 9),
            destination(3, false, 9),
            destination(4, true, 100),
        ];
        assert_eq!(
            select_destination(&candidates, false).map(|d| d.id),
            Some(DestinationId(2))
        );
    }

    #[test]
    fn test_no_matching_mode_selects_none() {
        let candidates = [destination(1, true, 5)];
        assert!(select_destination(&candidates, false).is_none());
    }

    #[tokio::test]
    async fn test_provider_lookup_failure_keeps_selection() {
        let network = MemoryNetwork::new();
        let id = network.add_destination(false, 4, Some(ProviderId(7)));
        network.update_faults(|f| f.fail_provider_lookup = true);
        let selector = DestinationSelector::new(Arc::new(network.clone()));

        let selected = selector
            .resolve(&network.client(), false)
            .await
            .expect("resolve")
            .expect("selected");

        assert_eq!(selected.id, id);
        assert_eq!(selected.provider_id, None);
    }

    #[tokio::test]
    async fn test_list_with_providers() {
        let network = MemoryNetwork::new();
        network.add_destination(false, 1, Some(ProviderId(7)));
        network.add_destination(true, 2, None);
        let selector = DestinationSelector::new(Arc::new(network.clone()));

        let listed = selector
            .list_with_providers(&network.client())
            .await
            .expect("list");

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].provider_id, Some(ProviderId(7)));
        assert_eq!(listed[1].provider_id, None);
    }
}
