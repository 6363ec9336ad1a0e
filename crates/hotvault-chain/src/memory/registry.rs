//! Simulated destination registry.

use async_trait::async_trait;
use tracing::info;

use hotvault_core::error::AppError;
use hotvault_core::result::AppResult;
use hotvault_core::traits::{DestinationRecord, DestinationRegistry, TxStatus};
use hotvault_core::types::{Address, DestinationId, ProviderId, TxHash};

use super::{DEVNET_PROVIDER, devnet_payee};
use super::network::{ChainCall, MemoryNetwork};

#[async_trait]
impl DestinationRegistry for MemoryNetwork {
    async fn list_client_destinations(&self, client: &Address) -> AppResult<Vec<DestinationRecord>> {
        self.record(ChainCall::ListDestinations);
        let state = self.lock();
        if !state.owns(client) {
            return Ok(Vec::new());
        }
        Ok(state.destinations.clone())
    }

    async fn resolve_provider_id(&self, destination: DestinationId) -> AppResult<Option<ProviderId>> {
        self.record(ChainCall::ResolveProvider(destination));
        if self.faults().fail_provider_lookup {
            return Err(AppError::external(format!(
                "provider registry lookup for destination {destination} failed"
            )));
        }
        Ok(self.lock().providers.get(&destination).copied())
    }

    async fn create_destination(&self, client: &Address, with_cdn: bool) -> AppResult<TxHash> {
        self.record(ChainCall::CreateDestination { with_cdn });
        if self.faults().fail_destination_creation {
            return Err(AppError::external("destination creation rejected by provider"));
        }
        let mut state = self.lock();
        if !state.owns(client) {
            return Err(AppError::validation(format!("unknown client {client}")));
        }
        let id = DestinationId(state.next_destination);
        state.next_destination += 1;
        let tx = state.mine(TxStatus::Success);
        state.pending_destinations.insert(
            tx.clone(),
            DestinationRecord {
                id,
                payee: devnet_payee(),
                with_cdn,
                current_piece_count: 0,
            },
        );
        info!(destination_id = %id, tx = %tx, "[MemoryNetwork] Destination creation submitted");
        Ok(tx)
    }

    async fn confirm_destination(&self, tx: &TxHash) -> AppResult<DestinationRecord> {
        self.record(ChainCall::ConfirmDestination(tx.clone()));
        let mut state = self.lock();
        let record = state
            .pending_destinations
            .remove(tx)
            .ok_or_else(|| AppError::not_found(format!("No destination created by {tx}")))?;
        state.providers.insert(record.id, DEVNET_PROVIDER);
        state.destinations.push(record.clone());
        Ok(record)
    }
}
