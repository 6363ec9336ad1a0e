//! Integration tests across the payment, chain, and service crates.

mod helpers;
mod metrics_test;
mod preflight_test;
mod upload_test;
