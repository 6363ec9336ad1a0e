//! HotVault: storage allowance and upload orchestration client.
//!
//! Parses the command line, loads configuration, installs logging, and
//! dispatches to the selected command.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use hotvault_cli::Cli;
use hotvault_cli::output;
use hotvault_core::config::AppConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::debug!(config = %cli.config, "Configuration loaded");

    if let Err(e) = cli.execute(&config).await {
        tracing::debug!(kind = %e.kind, error = ?e, "Command failed");
        output::print_error(&e.to_string());
        if let Some(shortfall) = e.shortfall() {
            output::print_kv("Deposit needed", &shortfall.deposit.to_token_string());
            output::print_kv("Rate allowance", &shortfall.rate_limit.to_token_string());
            output::print_kv("Lockup allowance", &shortfall.lockup_limit.to_token_string());
        }
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. Logs go to stderr so command output stays parseable.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
