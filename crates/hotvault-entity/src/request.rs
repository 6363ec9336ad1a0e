//! Storage intent supplied by the caller.

use serde::{Deserialize, Serialize};

use hotvault_core::config::StorageConfig;
use hotvault_core::error::AppError;
use hotvault_core::result::AppResult;

/// Desired storage: how much, for how long, and in which CDN mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRequest {
    /// Capacity to pay for, in bytes.
    pub capacity_bytes: u64,
    /// Days of storage the lockup should guarantee.
    pub persistence_days: u64,
    /// Runway below which lockup counts as insufficient.
    pub min_days_threshold: u64,
    /// Whether CDN-backed storage is requested.
    pub use_cdn: bool,
}

impl StorageRequest {
    /// Create a validated request.
    ///
    /// All numeric fields must be positive and the threshold may not exceed
    /// the persistence period.
    pub fn new(
        capacity_bytes: u64,
        persistence_days: u64,
        min_days_threshold: u64,
        use_cdn: bool,
    ) -> AppResult<Self> {
        if capacity_bytes == 0 {
            return Err(AppError::validation("Capacity must be positive"));
        }
        if persistence_days == 0 {
            return Err(AppError::validation("Persistence days must be positive"));
        }
        if min_days_threshold == 0 {
            return Err(AppError::validation("Minimum days threshold must be positive"));
        }
        if min_days_threshold > persistence_days {
            return Err(AppError::validation(format!(
                "Minimum days threshold ({min_days_threshold}) cannot exceed persistence days ({persistence_days})"
            )));
        }
        Ok(Self {
            capacity_bytes,
            persistence_days,
            min_days_threshold,
            use_cdn,
        })
    }

    /// Request for the configured default capacity and durations.
    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        Self::new(
            config.capacity_bytes(),
            config.persistence_days,
            config.min_days_threshold,
            config.with_cdn,
        )
    }

    /// Same durations, different capacity.
    pub fn with_capacity(self, capacity_bytes: u64) -> AppResult<Self> {
        Self::new(
            capacity_bytes,
            self.persistence_days,
            self.min_days_threshold,
            self.use_cdn,
        )
    }

    /// Same request, different CDN mode.
    pub fn with_cdn(mut self, use_cdn: bool) -> Self {
        self.use_cdn = use_cdn;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotvault_core::error::ErrorKind;

    #[test]
    fn test_rejects_zero_fields() {
        assert!(StorageRequest::new(0, 30, 10, false).is_err());
        assert!(StorageRequest::new(1, 0, 10, false).is_err());
        assert!(StorageRequest::new(1, 30, 0, false).is_err());
    }

    #[test]
    fn test_rejects_threshold_beyond_persistence() {
        let err = StorageRequest::new(10 * (1 << 30), 30, 40, false).expect_err("threshold");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("cannot exceed"));

        let request = StorageRequest::new(10 * (1 << 30), 30, 30, false).expect("equal is fine");
        assert_eq!(request.min_days_threshold, request.persistence_days);
        assert!(request.with_capacity(1).is_ok());
    }

    #[test]
    fn test_from_default_config() {
        let request = StorageRequest::from_config(&StorageConfig::default()).expect("valid");
        assert_eq!(request.capacity_bytes, 10 * (1 << 30));
        assert_eq!(request.persistence_days, 30);
        assert!(!request.use_cdn);
    }
}
