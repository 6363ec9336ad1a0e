//! `balance`: wallet, escrow, and allowance figures.

use clap::Args;

use hotvault_core::result::AppResult;
use hotvault_core::types::units::{GIB, format_bytes};
use hotvault_entity::BalanceSheet;
use hotvault_service::ServiceContext;

use crate::output::{self, OutputFormat};

/// Arguments for the balance command
#[derive(Debug, Args)]
pub struct BalanceArgs {
    /// Capacity to scale the needed rate allowance to, in GiB
    #[arg(long)]
    pub capacity_gib: Option<u64>,
    /// Price the needed rate allowance for CDN-backed storage
    #[arg(long)]
    pub cdn: bool,
}

/// Execute the balance command
pub async fn execute(args: &BalanceArgs, ctx: &ServiceContext, format: OutputFormat) -> AppResult<()> {
    let capacity = args
        .capacity_gib
        .map(|gib| gib.saturating_mul(GIB))
        .unwrap_or_else(|| ctx.storage.capacity_bytes());
    let with_cdn = args.cdn || ctx.storage.with_cdn;

    let sheet = ctx
        .balance_fetcher()
        .fetch(&ctx.client, ctx.network(), capacity, with_cdn)
        .await?;

    output::print_item(&sheet, &rows(&sheet, capacity), format);
    Ok(())
}

fn rows(sheet: &BalanceSheet, capacity: u64) -> Vec<(&'static str, String)> {
    let snapshot = &sheet.snapshot;
    vec![
        ("Network", sheet.network.clone()),
        ("Wallet balance", sheet.wallet_balance.to_token_string()),
        ("Escrow funds", sheet.escrow.funds.to_token_string()),
        ("Escrow available", sheet.escrow.available_funds.to_token_string()),
        ("Service approved", output::yes_no(sheet.service_approved)),
        ("Rate allowance", snapshot.rate_allowance_current.to_token_string()),
        ("Rate used", snapshot.rate_used.to_token_string()),
        ("Lockup allowance", snapshot.lockup_allowance_current.to_token_string()),
        ("Lockup used", snapshot.lockup_used.to_token_string()),
        (
            "Rate needed",
            format!(
                "{} (for {})",
                snapshot.rate_allowance_needed.to_token_string(),
                format_bytes(capacity)
            ),
        ),
    ]
}
