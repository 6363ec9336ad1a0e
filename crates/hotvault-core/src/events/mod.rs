//! Events emitted by HotVault operations.
//!
//! Upload sessions publish [`UploadProgress`] events to whoever started
//! them. The orchestrator is the single source of ordering; consumers
//! are notified and never asked for permission to continue.

pub mod upload;

pub use upload::{UploadProgress, UploadStage};
