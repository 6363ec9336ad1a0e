//! Reads of a client's on-chain payment state.

pub mod fetcher;

pub use fetcher::BalanceFetcher;
