//! CLI command definitions and dispatch.

pub mod balance;
pub mod config;
pub mod datasets;
pub mod metrics;
pub mod upload;

use clap::{Parser, Subcommand};
use tracing::info;

use hotvault_chain::memory::{DEVNET_PROVIDER, devnet_config};
use hotvault_chain::{GatewayClient, MemoryNetwork};
use hotvault_core::config::AppConfig;
use hotvault_core::error::AppError;
use hotvault_core::result::AppResult;
use hotvault_core::types::{Address, TokenAmount};
use hotvault_service::{Collaborators, ServiceContext};

use crate::output::OutputFormat;

/// Tokens credited to the simulated wallet.
const SIMULATED_WALLET_TOKENS: u64 = 1_000;

/// HotVault: pay-for-capacity storage allowances and uploads.
#[derive(Debug, Parser)]
#[command(name = "hotvault", version, about)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: String,

    /// Configuration overlay name (`config/{env}.toml`)
    #[arg(long, env = "HOTVAULT_ENV", global = true)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Network to use instead of the configured active one
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// Run against an in-process simulated network instead of the bridge
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show wallet, escrow, and allowance figures
    Balance(balance::BalanceArgs),
    /// Check whether allowances cover a storage request
    Metrics(metrics::MetricsArgs),
    /// List storage destinations and the one uploads would use
    Datasets(datasets::DatasetsArgs),
    /// Upload a file
    Upload(upload::UploadArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Load the configuration this invocation points at.
    pub fn load_config(&self) -> AppResult<AppConfig> {
        load_config(&self.config, self.env.as_deref())
    }

    /// Execute the parsed command
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.command {
            Commands::Config(args) => config::execute(args, config, &self.config, self.format),
            Commands::Balance(args) => {
                balance::execute(args, &self.connect(config)?, self.format).await
            }
            Commands::Metrics(args) => {
                metrics::execute(args, &self.connect(config)?, self.format).await
            }
            Commands::Datasets(args) => {
                datasets::execute(args, &self.connect(config)?, self.format).await
            }
            Commands::Upload(args) => {
                upload::execute(args, &self.connect(config)?, self.format).await
            }
        }
    }

    /// Build the service context for the selected network and backend.
    pub fn connect(&self, config: &AppConfig) -> AppResult<ServiceContext> {
        if self.simulate {
            return self.connect_simulated(config);
        }

        let network = self.network.as_deref().unwrap_or(&config.network.active);
        if config.gateway.client_address.trim().is_empty() {
            return Err(AppError::configuration(
                "gateway.client_address must be set (or use --simulate)",
            ));
        }
        let client = Address::parse(&config.gateway.client_address)?;
        let gateway = GatewayClient::new(&config.gateway)?;
        info!(network, bridge = %config.gateway.url, client = %client, "Connecting to bridge");
        ServiceContext::for_network(config, network, client, Collaborators::shared(gateway))
    }

    fn connect_simulated(&self, config: &AppConfig) -> AppResult<ServiceContext> {
        let mut config = config.clone();
        config.network = devnet_config();
        let network_id = self
            .network
            .clone()
            .unwrap_or_else(|| config.network.active.clone());

        let network = MemoryNetwork::with_prices(config.pricing.price_table()?);
        network.fund_wallet(TokenAmount::from_tokens(SIMULATED_WALLET_TOKENS));
        network.add_destination(false, 3, Some(DEVNET_PROVIDER));
        info!(network = %network_id, client = %network.client(), "Using simulated network");

        let client = network.client();
        ServiceContext::for_network(&config, &network_id, client, Collaborators::shared(network))
    }
}

/// Load configuration from `path` with an optional `{env}` overlay.
pub fn load_config(path: &str, env: Option<&str>) -> AppResult<AppConfig> {
    match env {
        Some(env) => AppConfig::load_with_env(path, env),
        None => AppConfig::load(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotvault_core::error::ErrorKind;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse")
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["hotvault", "metrics", "--capacity-gib", "5", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Metrics(args) => assert_eq!(args.capacity_gib, Some(5)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_simulated_context_uses_devnet() {
        let cli = parse(&["hotvault", "--simulate", "balance"]);
        let ctx = cli.connect(&AppConfig::default()).expect("connect");
        assert_eq!(ctx.network(), "devnet");
    }

    #[test]
    fn test_simulated_unknown_network_rejected() {
        let cli = parse(&["hotvault", "--simulate", "--network", "mainnet", "balance"]);
        let err = cli.connect(&AppConfig::default()).expect_err("should fail");
        assert_eq!(err.kind, ErrorKind::InvalidNetwork);
    }

    #[test]
    fn test_bridge_requires_client_address() {
        let cli = parse(&["hotvault", "balance"]);
        let err = cli.connect(&AppConfig::default()).expect_err("should fail");
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
