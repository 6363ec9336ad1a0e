//! Upload orchestration.

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{UploadHandle, UploadOrchestrator, UploadRequest};
pub use progress::ProgressSink;
