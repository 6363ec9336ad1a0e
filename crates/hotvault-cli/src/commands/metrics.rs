//! `metrics`: sufficiency of the current allowances for a storage request.

use clap::Args;

use hotvault_core::result::AppResult;
use hotvault_core::types::units::{GIB, format_bytes};
use hotvault_entity::{StorageRequest, SufficiencyReport};
use hotvault_service::ServiceContext;

use crate::output::{self, OutputFormat};

/// Arguments for the metrics command
#[derive(Debug, Args)]
pub struct MetricsArgs {
    /// Capacity to pay for, in GiB (defaults to `storage.capacity_gib`)
    #[arg(long)]
    pub capacity_gib: Option<u64>,
    /// Days of storage to guarantee (defaults to `storage.persistence_days`)
    #[arg(long)]
    pub days: Option<u64>,
    /// Price CDN-backed storage
    #[arg(long)]
    pub cdn: bool,
}

impl MetricsArgs {
    /// The storage request these arguments describe, on top of the configured defaults.
    pub fn request(&self, ctx: &ServiceContext) -> AppResult<StorageRequest> {
        let capacity = self
            .capacity_gib
            .map(|gib| gib.saturating_mul(GIB))
            .unwrap_or_else(|| ctx.storage.capacity_bytes());
        let days = self.days.unwrap_or(ctx.storage.persistence_days);
        StorageRequest::new(
            capacity,
            days,
            ctx.storage.min_days_threshold.min(days),
            self.cdn || ctx.storage.with_cdn,
        )
    }
}

/// Execute the metrics command
pub async fn execute(args: &MetricsArgs, ctx: &ServiceContext, format: OutputFormat) -> AppResult<()> {
    let request = args.request(ctx)?;
    let snapshot = ctx
        .balance_fetcher()
        .fetch_snapshot(&ctx.client, ctx.network(), request.capacity_bytes, request.use_cdn)
        .await?;
    let report = ctx.metrics().compute_metrics(&request, &snapshot);

    output::print_item(&report, &rows(&request, &report), format);
    if format == OutputFormat::Table {
        if report.is_sufficient {
            output::print_success("Allowances cover this request.");
        } else {
            output::print_warning(&format!(
                "Allowances are insufficient; deposit {} to cover {} days.",
                report.deposit_needed.to_token_string(),
                request.persistence_days
            ));
        }
        if report.runway_unbounded() {
            output::print_warning("Nothing is charged yet, so the runway cannot be estimated.");
        }
    }
    Ok(())
}

fn rows(request: &StorageRequest, report: &SufficiencyReport) -> Vec<(&'static str, String)> {
    vec![
        ("Capacity", format_bytes(request.capacity_bytes)),
        ("Persistence", format!("{} days", request.persistence_days)),
        ("CDN", output::yes_no(request.use_cdn)),
        ("Rate needed / epoch", report.rate_needed.to_token_string()),
        ("Lockup per day", report.lockup_per_day.to_token_string()),
        ("Lockup needed", report.lockup_needed.to_token_string()),
        ("Deposit needed", report.deposit_needed.to_token_string()),
        ("Days left", output::days(report.persistence_days_left)),
        ("Current usage (est.)", format_bytes(report.current_usage_bytes)),
        ("Rate sufficient", output::yes_no(report.is_rate_sufficient)),
        ("Lockup sufficient", output::yes_no(report.is_lockup_sufficient)),
    ]
}
