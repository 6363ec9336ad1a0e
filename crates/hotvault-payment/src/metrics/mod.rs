//! Storage metrics: sufficiency of current allowances for a storage request.

pub mod calculator;

pub use calculator::{DestinationPlan, StorageMetricsCalculator};
