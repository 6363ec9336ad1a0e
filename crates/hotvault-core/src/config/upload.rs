//! Upload orchestration timing and size limits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upload orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Fixed wait used in place of confirmation when the provider surfaces
    /// no root-registration transaction hash.
    #[serde(default = "default_grace_period")]
    pub grace_period_seconds: u64,
    /// Upper bound on waiting for the registration receipt and the
    /// provider's root confirmation.
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_seconds: u64,
    /// Smallest payload the provider accepts.
    #[serde(default = "default_min_file_size")]
    pub min_file_size_bytes: u64,
    /// Largest payload accepted for a single upload.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
}

impl UploadConfig {
    /// Grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_seconds)
    }

    /// Confirmation timeout as a [`Duration`].
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_seconds)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            grace_period_seconds: default_grace_period(),
            confirmation_timeout_seconds: default_confirmation_timeout(),
            min_file_size_bytes: default_min_file_size(),
            max_file_size_bytes: default_max_file_size(),
        }
    }
}

fn default_grace_period() -> u64 {
    30
}

fn default_confirmation_timeout() -> u64 {
    300
}

fn default_min_file_size() -> u64 {
    65
}

fn default_max_file_size() -> u64 {
    209_715_200 // 200 MiB
}
