//! Destination (dataset) selection.

pub mod selector;

pub use selector::{DestinationSelector, select_destination};
