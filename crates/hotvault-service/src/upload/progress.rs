//! Progress notifications for callers.

use tokio::sync::mpsc;
use tracing::info;

use hotvault_core::events::UploadProgress;

/// Where an upload reports progress.
///
/// Sending never waits on the consumer; events for a dropped receiver are
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<UploadProgress>>,
}

impl ProgressSink {
    /// Report into `tx`.
    pub fn new(tx: mpsc::UnboundedSender<UploadProgress>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink and the receiver that reads it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UploadProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Log only.
    pub fn discard() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&self, progress: UploadProgress) {
        info!(
            session_id = %progress.session_id,
            stage = %progress.stage,
            percent = progress.progress_percent,
            "{}",
            progress.status_message
        );
        if let Some(tx) = &self.tx {
            let _ = tx.send(progress);
        }
    }
}
