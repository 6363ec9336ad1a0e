//! # hotvault-core
//!
//! Core crate for HotVault. Contains configuration schemas, token and
//! identifier types, the collaborator traits implemented by chain/provider
//! backends, upload progress events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other HotVault crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
