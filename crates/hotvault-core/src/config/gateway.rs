//! SDK bridge (gateway) connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the chain/provider bridge.
    #[serde(default = "default_url")]
    pub url: String,
    /// Address of the paying client wallet.
    #[serde(default)]
    pub client_address: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            client_address: String::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_request_timeout() -> u64 {
    60
}
