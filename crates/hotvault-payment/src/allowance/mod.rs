//! Pure allowance arithmetic.

pub mod math;

pub use math::{
    Runway, current_storage_usage_bytes, is_lockup_sufficient, is_rate_sufficient,
    lockup_per_day, persistence_days_left, price_per_tib_per_epoch, rate_per_epoch,
    required_lockup,
};
