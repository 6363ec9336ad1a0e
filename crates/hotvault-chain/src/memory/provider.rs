//! Simulated storage provider.
//!
//! Emits the provider notifications in their real order and registers the
//! root by mining a transaction, honoring the fault switches.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use hotvault_core::error::AppError;
use hotvault_core::result::AppResult;
use hotvault_core::traits::{ProviderEvent, ProviderEventSender, StorageProviderClient, TxStatus};
use hotvault_core::types::{DestinationId, PieceCid, RootId};

use super::network::{ChainCall, MemoryNetwork};

/// Deterministic stand-in for a piece commitment.
fn piece_cid(data: &[u8]) -> AppResult<PieceCid> {
    let digest = data.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    PieceCid::parse(&format!("baga6ea4seaq{digest:016x}{:08x}", data.len()))
}

#[async_trait]
impl StorageProviderClient for MemoryNetwork {
    async fn upload(
        &self,
        destination: DestinationId,
        data: Bytes,
        events: ProviderEventSender,
    ) -> AppResult<PieceCid> {
        self.record(ChainCall::Upload {
            destination,
            size_bytes: data.len() as u64,
        });

        let delay = self.lock().transfer_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let faults = self.faults();
        if faults.fail_transfer {
            return Err(AppError::transfer("provider rejected the upload"));
        }
        if !self.lock().destinations.iter().any(|d| d.id == destination) {
            return Err(AppError::transfer(format!(
                "destination {destination} is not served by this provider"
            )));
        }

        let commp = piece_cid(&data)?;
        // A closed receiver only means nobody is listening.
        let _ = events.send(ProviderEvent::TransferComplete {
            commp: commp.clone(),
        });

        let status = if faults.revert_root_registration {
            TxStatus::Reverted
        } else {
            TxStatus::Success
        };
        let tx = self.lock().mine(status);
        let _ = events.send(ProviderEvent::RootSubmitted {
            tx_hash: (!faults.omit_root_tx_hash).then(|| tx.clone()),
        });

        if status == TxStatus::Success && !faults.withhold_root_confirmation {
            let root_id = {
                let mut state = self.lock();
                let root_id = RootId(state.next_root);
                state.next_root += 1;
                if let Some(record) = state.destinations.iter_mut().find(|d| d.id == destination) {
                    record.current_piece_count += 1;
                }
                root_id
            };
            let _ = events.send(ProviderEvent::RootConfirmed {
                root_ids: vec![root_id],
            });
        }

        info!(
            destination_id = %destination,
            commp = %commp,
            size = data.len(),
            "[MemoryNetwork] Upload accepted"
        );
        Ok(commp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let network = MemoryNetwork::new();
        let destination = network.add_destination(false, 0, None);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let commp = network
            .upload(destination, Bytes::from_static(&[7u8; 128]), tx)
            .await
            .expect("upload");

        assert_eq!(
            rx.recv().await,
            Some(ProviderEvent::TransferComplete { commp })
        );
        assert!(matches!(
            rx.recv().await,
            Some(ProviderEvent::RootSubmitted { tx_hash: Some(_) })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(ProviderEvent::RootConfirmed { .. })
        ));
        assert_eq!(network.destinations()[0].current_piece_count, 1);
    }

    #[tokio::test]
    async fn test_omitted_hash_and_withheld_confirmation() {
        let network = MemoryNetwork::new();
        let destination = network.add_destination(false, 0, None);
        network.update_faults(|f| {
            f.omit_root_tx_hash = true;
            f.withhold_root_confirmation = true;
        });
        let (tx, mut rx) = mpsc::unbounded_channel();

        network
            .upload(destination, Bytes::from_static(&[1u8; 100]), tx)
            .await
            .expect("upload");

        assert!(matches!(
            rx.recv().await,
            Some(ProviderEvent::TransferComplete { .. })
        ));
        assert_eq!(
            rx.recv().await,
            Some(ProviderEvent::RootSubmitted { tx_hash: None })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_piece_cid_is_deterministic() {
        let a = piece_cid(b"hello world").expect("cid");
        let b = piece_cid(b"hello world").expect("cid");
        let c = piece_cid(b"hello worle").expect("cid");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
