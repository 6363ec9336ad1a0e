//! # hotvault-payment
//!
//! Client-side accounting for pay-for-capacity storage: converting capacity
//! and persistence into rate/lockup requirements, reading the client's
//! current allowances, judging sufficiency, and topping allowances up.

pub mod allowance;
pub mod balance;
pub mod metrics;
pub mod preflight;

pub use balance::BalanceFetcher;
pub use metrics::{DestinationPlan, StorageMetricsCalculator};
pub use preflight::{DepositApprover, DepositPlan, PreflightGate, PreflightOutcome};
