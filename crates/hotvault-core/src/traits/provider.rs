//! Storage provider transfer.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::AppResult;
use crate::types::{DestinationId, PieceCid, RootId, TxHash};

/// Notifications a provider emits while an upload progresses.
///
/// Ordering is transfer-complete, root-submitted, root-confirmed. A
/// root-submitted notification does not always carry a transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProviderEvent {
    /// Bytes were accepted and the piece commitment computed.
    TransferComplete {
        /// The piece commitment.
        commp: PieceCid,
    },
    /// The root-registration transaction was submitted.
    RootSubmitted {
        /// Transaction hash, if the provider surfaced one.
        tx_hash: Option<TxHash>,
    },
    /// The provider confirmed the roots were accepted.
    RootConfirmed {
        /// Root identifiers assigned within the destination.
        root_ids: Vec<RootId>,
    },
}

/// Channel used by providers to notify the orchestrator.
pub type ProviderEventSender = mpsc::UnboundedSender<ProviderEvent>;

/// Storage provider that accepts bytes for a destination.
#[async_trait]
pub trait StorageProviderClient: Send + Sync + std::fmt::Debug + 'static {
    /// Upload `data` into `destination`, emitting [`ProviderEvent`]s as the
    /// transfer and root registration progress. Returns the piece commitment.
    async fn upload(
        &self,
        destination: DestinationId,
        data: Bytes,
        events: ProviderEventSender,
    ) -> AppResult<PieceCid>;
}
