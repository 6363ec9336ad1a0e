//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod gateway;
pub mod logging;
pub mod network;
pub mod pricing;
pub mod storage;
pub mod upload;

use serde::{Deserialize, Serialize};

pub use self::gateway::GatewayConfig;
pub use self::logging::LoggingConfig;
pub use self::network::{NetworkConfig, NetworkContracts, NetworkEntry};
pub use self::pricing::{PriceTable, PricingConfig};
pub use self::storage::StorageConfig;
pub use self::upload::UploadConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (base file + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network and contract settings.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Storage price table.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Default storage intent.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload orchestration settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// SDK bridge settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges the file (if present) with environment variables prefixed
    /// with `HOTVAULT__`, then validates the result.
    pub fn load(path: &str) -> Result<Self, AppError> {
        Self::load_layers(&[path])
    }

    /// Load a base file with an environment-specific overlay
    /// (`config/{env}.toml` next to the base file).
    pub fn load_with_env(path: &str, env: &str) -> Result<Self, AppError> {
        let overlay = std::path::Path::new(path)
            .with_file_name(format!("{env}.toml"))
            .to_string_lossy()
            .into_owned();
        Self::load_layers(&[path, &overlay])
    }

    fn load_layers(paths: &[&str]) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        for path in paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("HOTVAULT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.storage.capacity_gib == 0 {
            return Err(AppError::configuration("storage.capacity_gib must be positive"));
        }
        if self.storage.persistence_days == 0 {
            return Err(AppError::configuration(
                "storage.persistence_days must be positive",
            ));
        }
        if self.storage.min_days_threshold == 0 {
            return Err(AppError::configuration(
                "storage.min_days_threshold must be positive",
            ));
        }
        if self.storage.min_days_threshold > self.storage.persistence_days {
            return Err(AppError::configuration(
                "storage.min_days_threshold cannot exceed storage.persistence_days",
            ));
        }
        if self.upload.min_file_size_bytes > self.upload.max_file_size_bytes {
            return Err(AppError::configuration(
                "upload.min_file_size_bytes cannot exceed upload.max_file_size_bytes",
            ));
        }

        let table = self.pricing.price_table()?;
        if table.per_tib_per_month_no_cdn.is_zero() || table.per_tib_per_month_with_cdn.is_zero()
        {
            return Err(AppError::configuration("pricing prices must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.persistence_days, 30);
        assert_eq!(config.upload.grace_period_seconds, 30);
    }

    #[test]
    fn test_threshold_above_persistence_rejected() {
        let mut config = AppConfig::default();
        config.storage.min_days_threshold = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_price_rejected() {
        let mut config = AppConfig::default();
        config.pricing.price_per_tib_per_month_no_cdn = "0".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist").expect("load");
        assert_eq!(config.storage.capacity_gib, 10);
    }
}
