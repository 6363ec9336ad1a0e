//! Preflight gate: tops allowances up before any byte is transferred.

pub mod gate;

pub use gate::{DepositApprover, DepositPlan, PreflightGate, PreflightOutcome};
