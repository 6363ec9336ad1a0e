//! Default storage intent used when a command does not override it.

use serde::{Deserialize, Serialize};

use crate::types::units::GIB;

/// Storage intent defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Capacity the client budgets for, in GiB.
    #[serde(default = "default_capacity_gib")]
    pub capacity_gib: u64,
    /// How many days of storage the lockup should guarantee.
    #[serde(default = "default_persistence_days")]
    pub persistence_days: u64,
    /// Runway (in days) below which lockup is considered insufficient.
    #[serde(default = "default_min_days_threshold")]
    pub min_days_threshold: u64,
    /// Whether uploads go to CDN-backed destinations by default.
    #[serde(default)]
    pub with_cdn: bool,
}

impl StorageConfig {
    /// Configured capacity in bytes.
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_gib.saturating_mul(GIB)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity_gib: default_capacity_gib(),
            persistence_days: default_persistence_days(),
            min_days_threshold: default_min_days_threshold(),
            with_cdn: false,
        }
    }
}

fn default_capacity_gib() -> u64 {
    10
}

fn default_persistence_days() -> u64 {
    30
}

fn default_min_days_threshold() -> u64 {
    10
}
