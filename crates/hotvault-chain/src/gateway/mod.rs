//! HTTP client for the SDK bridge.
//!
//! The bridge fronts the chain SDK and exposes the collaborator
//! operations as JSON endpoints. Every response is decoded into an explicit
//! DTO before it reaches the engine.

pub mod client;
pub mod dto;

pub use client::GatewayClient;
