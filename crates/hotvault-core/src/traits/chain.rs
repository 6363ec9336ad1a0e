//! Transaction confirmation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::TxHash;

/// Final status of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// The transaction executed successfully.
    Success,
    /// The transaction was mined but reverted.
    Reverted,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Hash of the transaction.
    pub tx_hash: TxHash,
    /// Execution status.
    pub status: TxStatus,
    /// Block the transaction was included in.
    pub block_number: u64,
}

impl TxReceipt {
    /// Whether the transaction executed successfully.
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}

/// Waits for submitted transactions to be mined.
#[async_trait]
pub trait TransactionWatcher: Send + Sync + std::fmt::Debug + 'static {
    /// Block until the transaction is mined and return its receipt.
    ///
    /// The wait is bounded by the implementation's own timeout.
    async fn wait_for_transaction(&self, tx: &TxHash) -> AppResult<TxReceipt>;
}
