//! `datasets`: the client's storage destinations.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use hotvault_core::result::AppResult;
use hotvault_entity::StorageDestination;
use hotvault_service::{ServiceContext, select_destination};

use crate::output::{self, OutputFormat};

/// Arguments for the datasets command
#[derive(Debug, Args)]
pub struct DatasetsArgs {
    /// Mark the destination a CDN-backed upload would use
    #[arg(long)]
    pub cdn: bool,
}

/// Destination display row for table output
#[derive(Debug, Serialize, Tabled)]
struct DestinationRow {
    /// Destination ID
    id: u64,
    /// Payee
    payee: String,
    /// CDN-backed
    cdn: String,
    /// Pieces
    pieces: u64,
    /// Provider
    provider: String,
    /// Whether uploads would append here
    selected: String,
}

impl DestinationRow {
    fn new(destination: &StorageDestination, selected: bool) -> Self {
        Self {
            id: destination.id.value(),
            payee: destination.payee_address.to_string(),
            cdn: output::yes_no(destination.with_cdn),
            pieces: destination.current_piece_count,
            provider: destination
                .provider_id
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            selected: if selected { "*" } else { "" }.to_string(),
        }
    }
}

/// Execute the datasets command
pub async fn execute(args: &DatasetsArgs, ctx: &ServiceContext, format: OutputFormat) -> AppResult<()> {
    let use_cdn = args.cdn || ctx.storage.with_cdn;
    let destinations = ctx.selector().list_with_providers(&ctx.client).await?;
    let selected = select_destination(&destinations, use_cdn).map(|d| d.id);

    let rows: Vec<DestinationRow> = destinations
        .iter()
        .map(|d| DestinationRow::new(d, Some(d.id) == selected))
        .collect();
    output::print_list(&rows, format);

    if format == OutputFormat::Table && selected.is_none() {
        output::print_warning(&format!(
            "No {} destination yet; the next upload will create one.",
            if use_cdn { "CDN" } else { "non-CDN" }
        ));
    }
    Ok(())
}
