//! `config`: inspect and validate configuration.

use clap::{Args, Subcommand};

use hotvault_core::config::AppConfig;
use hotvault_core::result::AppResult;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration and every configured network
    Validate,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    config_path: &str,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        ConfigCommand::Show => {
            match format {
                OutputFormat::Json => output::print_json(config),
                OutputFormat::Table => {
                    println!("Configuration ({}):", config_path);
                    output::print_kv("Active network", &config.network.active);
                    output::print_kv("Capacity", &format!("{} GiB", config.storage.capacity_gib));
                    output::print_kv(
                        "Persistence",
                        &format!("{} days", config.storage.persistence_days),
                    );
                    output::print_kv(
                        "Min days threshold",
                        &config.storage.min_days_threshold.to_string(),
                    );
                    output::print_kv("CDN by default", &output::yes_no(config.storage.with_cdn));
                    output::print_kv(
                        "Grace period",
                        &format!("{}s", config.upload.grace_period_seconds),
                    );
                    output::print_kv(
                        "Confirmation timeout",
                        &format!("{}s", config.upload.confirmation_timeout_seconds),
                    );
                    output::print_kv("Bridge URL", &config.gateway.url);
                    output::print_kv("Log level", &config.logging.level);
                }
            }
            Ok(())
        }
        ConfigCommand::Validate => {
            config.validate()?;
            let mut names: Vec<&String> = config.network.networks.keys().collect();
            names.sort();
            let mut failures = 0;
            for name in names {
                match config.network.resolve(name) {
                    Ok(contracts) => output::print_success(&format!(
                        "{} (chain {}): contracts valid",
                        name, contracts.chain_id
                    )),
                    Err(e) => {
                        failures += 1;
                        output::print_error(&format!("{}: {}", name, e.message));
                    }
                }
            }
            config.network.resolve_active()?;
            if failures > 0 {
                output::print_warning(&format!("{} network(s) failed validation", failures));
            } else {
                output::print_success("Configuration is valid.");
            }
            Ok(())
        }
    }
}
