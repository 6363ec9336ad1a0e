//! Conversions between capacity, epoch rates, lockup, and persistence days.
//!
//! Every monetary value is an integer in base units and every division
//! truncates, so a client is never charged more than the exact price.
//! Floating point only appears in day counts shown to users.

use primitive_types::U256;

use hotvault_core::types::TokenAmount;
use hotvault_core::types::amount::u256_to_f64;
use hotvault_core::types::units::{EPOCHS_PER_MONTH, TIB};

/// Price per TiB per epoch from a monthly TiB price (floor).
pub fn price_per_tib_per_epoch(price_per_tib_per_month: TokenAmount) -> TokenAmount {
    TokenAmount::from_u256(price_per_tib_per_month.as_u256() / U256::from(EPOCHS_PER_MONTH))
}

/// Payment rate per epoch for `capacity_bytes` at `price_per_tib_per_epoch`.
///
/// `capacity × price / TiB`, truncated.
pub fn rate_per_epoch(capacity_bytes: u64, price_per_tib_per_epoch: TokenAmount) -> TokenAmount {
    let product = U256::from(capacity_bytes).saturating_mul(price_per_tib_per_epoch.as_u256());
    TokenAmount::from_u256(product / U256::from(TIB))
}

/// Lockup consumed per day at `rate` per epoch.
pub fn lockup_per_day(rate: TokenAmount, epochs_per_day: u64) -> TokenAmount {
    rate.saturating_mul_u64(epochs_per_day)
}

/// How long the remaining lockup lasts at the current daily charge.
///
/// Kept as an exact ratio so shortfalls can be computed without
/// converting money to floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runway {
    /// Nothing is charged and some lockup remains: no estimate is possible.
    Unbounded,
    /// Nothing remains.
    Exhausted,
    /// `remaining / per_day` days, with `per_day > 0`.
    Finite {
        /// Lockup not yet held by rails.
        remaining: TokenAmount,
        /// Lockup charged per day.
        per_day: TokenAmount,
    },
}

impl Runway {
    /// Classify `lockup_remaining` against `lockup_per_day`.
    pub fn new(lockup_remaining: TokenAmount, lockup_per_day: TokenAmount) -> Self {
        if lockup_per_day.is_zero() {
            if lockup_remaining.is_zero() {
                Self::Exhausted
            } else {
                Self::Unbounded
            }
        } else if lockup_remaining.is_zero() {
            Self::Exhausted
        } else {
            Self::Finite {
                remaining: lockup_remaining,
                per_day: lockup_per_day,
            }
        }
    }

    /// Runway in days; `f64::INFINITY` when unbounded.
    pub fn days(&self) -> f64 {
        match self {
            Self::Unbounded => f64::INFINITY,
            Self::Exhausted => 0.0,
            Self::Finite { remaining, per_day } => {
                let (r, p) = (remaining.as_u256(), per_day.as_u256());
                let whole = u256_to_f64(r / p);
                let frac = u256_to_f64(r % p) / u256_to_f64(p);
                whole + frac
            }
        }
    }

    /// Whether the runway covers at least `days`.
    pub fn covers(&self, days: u64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Exhausted => days == 0,
            Self::Finite { remaining, per_day } => {
                per_day.as_u256().saturating_mul(U256::from(days)) <= remaining.as_u256()
            }
        }
    }
}

/// Days the remaining lockup lasts at `lockup_per_day`.
///
/// Returns `f64::INFINITY` when nothing is charged and lockup remains.
/// Callers must read that as "cannot estimate yet", not "safe forever".
pub fn persistence_days_left(lockup_remaining: TokenAmount, lockup_per_day: TokenAmount) -> f64 {
    Runway::new(lockup_remaining, lockup_per_day).days()
}

/// Additional lockup needed to extend `runway` to `days_wanted`.
///
/// The shortfall is measured from the current runway, not from zero:
/// `(days_wanted − days_left) × lockup_per_day_needed + lockup_used`,
/// or zero when the runway already covers `days_wanted`.
pub fn required_lockup(
    days_wanted: u64,
    runway: &Runway,
    lockup_per_day_needed: TokenAmount,
    lockup_used: TokenAmount,
) -> TokenAmount {
    if runway.covers(days_wanted) {
        return TokenAmount::zero();
    }
    let wanted = U256::from(days_wanted);
    let shortfall = match runway {
        Runway::Unbounded => U256::zero(),
        Runway::Exhausted => wanted.saturating_mul(lockup_per_day_needed.as_u256()),
        Runway::Finite { remaining, per_day } => {
            let (r, p) = (remaining.as_u256(), per_day.as_u256());
            // (wanted − r/p) × needed = (wanted·p − r) × needed / p
            let missing = wanted.saturating_mul(p).saturating_sub(r);
            missing.saturating_mul(lockup_per_day_needed.as_u256()) / p
        }
    };
    TokenAmount::from_u256(shortfall).saturating_add(lockup_used)
}

/// Estimate of bytes currently stored, from the share of the needed rate in use.
///
/// `rate_used × capacity / rate_allowance_needed`. This assumes uniform
/// per-byte pricing and is an approximation, not an authoritative usage
/// figure. Returns 0 when nothing is needed.
pub fn current_storage_usage_bytes(
    rate_used: TokenAmount,
    rate_allowance_needed: TokenAmount,
    capacity_bytes: u64,
) -> u64 {
    if rate_allowance_needed.is_zero() {
        return 0;
    }
    let estimate = rate_used.as_u256().saturating_mul(U256::from(capacity_bytes))
        / rate_allowance_needed.as_u256();
    if estimate > U256::from(u64::MAX) {
        u64::MAX
    } else {
        estimate.low_u64()
    }
}

/// Whether the current rate allowance covers `rate_needed`.
pub fn is_rate_sufficient(rate_allowance_current: TokenAmount, rate_needed: TokenAmount) -> bool {
    rate_allowance_current >= rate_needed
}

/// Whether the runway meets the minimum threshold.
pub fn is_lockup_sufficient(persistence_days_left: f64, min_days_threshold: u64) -> bool {
    persistence_days_left >= min_days_threshold as f64
}
