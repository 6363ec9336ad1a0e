//! # hotvault-entity
//!
//! Domain models shared by the payment and service crates.
//!
//! Allowance snapshots and sufficiency reports are created fresh for every
//! computation and never persisted. Upload sessions live only as long as
//! the caller that started them.

pub mod allowance;
pub mod destination;
pub mod report;
pub mod request;
pub mod session;

pub use allowance::{AllowanceSnapshot, BalanceSheet};
pub use destination::StorageDestination;
pub use report::{ReportParts, SufficiencyReport};
pub use request::StorageRequest;
pub use session::{Confirmation, UploadResult, UploadSession};
