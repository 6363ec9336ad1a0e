//! # hotvault-service
//!
//! Application services for HotVault. [`ServiceContext`] is the explicit
//! connection object carrying the collaborators and settings for one
//! network; the dataset selector and the upload orchestrator are built
//! from it.

pub mod context;
pub mod destination;
pub mod upload;

pub use context::{Collaborators, ServiceContext};
pub use destination::{DestinationSelector, select_destination};
pub use upload::{ProgressSink, UploadHandle, UploadOrchestrator, UploadRequest};
