//! # hotvault-cli
//!
//! Command tree for the `hotvault` binary: balance and metrics reports,
//! destination listing, uploads, and configuration inspection.

pub mod approver;
pub mod commands;
pub mod output;

pub use commands::{Cli, Commands, load_config};
