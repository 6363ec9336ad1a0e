//! Sufficiency report produced by the storage metrics calculator.

use serde::{Deserialize, Serialize};

use hotvault_core::types::TokenAmount;

/// Whether current allowances cover a storage request, and by how much they fall short.
///
/// Reports are derived values: build them with [`SufficiencyReport::new`],
/// which fixes `is_sufficient` to the conjunction of the two predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SufficiencyReport {
    /// Rate per epoch the requested capacity costs.
    pub rate_needed: TokenAmount,
    /// Lockup per day at `rate_needed`.
    pub lockup_per_day: TokenAmount,
    /// Lockup allowance needed to reach the requested persistence.
    pub lockup_needed: TokenAmount,
    /// Destination creation fee included in `deposit_needed` (zero when reusing one).
    pub creation_fee: TokenAmount,
    /// `lockup_needed + creation_fee`.
    pub deposit_needed: TokenAmount,
    /// Runway of the current lockup at the current usage rate.
    ///
    /// `f64::INFINITY` means nothing is being charged yet, so no estimate
    /// is possible; it does not mean the client is covered forever.
    #[serde(with = "days")]
    pub persistence_days_left: f64,
    /// Approximate bytes currently stored; see `allowance::current_storage_usage_bytes`.
    pub current_usage_bytes: u64,
    /// The rate allowance that was in place when the report was made.
    pub rate_allowance_current: TokenAmount,
    /// The lockup allowance that was in place when the report was made.
    pub lockup_allowance_current: TokenAmount,
    /// `rate_allowance_current >= rate_needed`.
    pub is_rate_sufficient: bool,
    /// `persistence_days_left >= min_days_threshold`.
    pub is_lockup_sufficient: bool,
    /// Both predicates hold.
    pub is_sufficient: bool,
}

/// Inputs for [`SufficiencyReport::new`].
#[derive(Debug, Clone)]
pub struct ReportParts {
    /// Rate per epoch the requested capacity costs.
    pub rate_needed: TokenAmount,
    /// Lockup per day at `rate_needed`.
    pub lockup_per_day: TokenAmount,
    /// Lockup allowance needed.
    pub lockup_needed: TokenAmount,
    /// Destination creation fee.
    pub creation_fee: TokenAmount,
    /// Runway in days.
    pub persistence_days_left: f64,
    /// Approximate bytes stored.
    pub current_usage_bytes: u64,
    /// Current rate allowance.
    pub rate_allowance_current: TokenAmount,
    /// Current lockup allowance.
    pub lockup_allowance_current: TokenAmount,
    /// Rate predicate.
    pub is_rate_sufficient: bool,
    /// Lockup predicate.
    pub is_lockup_sufficient: bool,
}

impl SufficiencyReport {
    /// Build a report; `is_sufficient` and `deposit_needed` are derived.
    pub fn new(parts: ReportParts) -> Self {
        Self {
            rate_needed: parts.rate_needed,
            lockup_per_day: parts.lockup_per_day,
            lockup_needed: parts.lockup_needed,
            creation_fee: parts.creation_fee,
            deposit_needed: parts.lockup_needed.saturating_add(parts.creation_fee),
            persistence_days_left: parts.persistence_days_left,
            current_usage_bytes: parts.current_usage_bytes,
            rate_allowance_current: parts.rate_allowance_current,
            lockup_allowance_current: parts.lockup_allowance_current,
            is_rate_sufficient: parts.is_rate_sufficient,
            is_lockup_sufficient: parts.is_lockup_sufficient,
            is_sufficient: parts.is_rate_sufficient && parts.is_lockup_sufficient,
        }
    }

    /// Whether the runway could not be estimated because nothing is charged yet.
    pub fn runway_unbounded(&self) -> bool {
        self.persistence_days_left.is_infinite()
    }
}

/// Serializes infinite runway as the string `"unbounded"`, since JSON has no infinity.
mod days {
    use serde::{Deserialize, Deserializer, Serializer};

    const UNBOUNDED: &str = "unbounded";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_str(UNBOUNDED)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) if s == UNBOUNDED => Ok(f64::INFINITY),
            Raw::Text(s) => Err(serde::de::Error::custom(format!("invalid day count '{s}'"))),
        }
    }
}
