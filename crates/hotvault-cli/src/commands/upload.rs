//! `upload`: run one upload session and stream its progress.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use hotvault_core::error::{AppError, ErrorKind};
use hotvault_core::events::UploadProgress;
use hotvault_core::result::AppResult;
use hotvault_core::types::units::format_bytes;
use hotvault_entity::{Confirmation, UploadResult, UploadSession};
use hotvault_service::{ServiceContext, UploadHandle, UploadOrchestrator, UploadRequest};

use crate::approver::PromptApprover;
use crate::output::{self, OutputFormat};

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// File to upload
    pub file: PathBuf,
    /// Store on a CDN-backed destination
    #[arg(long)]
    pub cdn: bool,
    /// Top up allowances without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the upload command
pub async fn execute(args: &UploadArgs, ctx: &ServiceContext, format: OutputFormat) -> AppResult<()> {
    let data = tokio::fs::read(&args.file).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Io,
            format!("Failed to read '{}'", args.file.display()),
            e,
        )
    })?;
    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let mut orchestrator = UploadOrchestrator::new(ctx.clone());
    if !args.yes {
        orchestrator = orchestrator.with_approver(Arc::new(PromptApprover));
    }

    if format == OutputFormat::Table {
        println!(
            "Uploading {} ({}) to {}",
            file_name,
            format_bytes(data.len() as u64),
            ctx.network()
        );
    }
    let request = UploadRequest::new(file_name, data, args.cdn || ctx.storage.with_cdn);
    let handle = orchestrator.start(request);
    let mut session = follow(handle, format).await?;

    if let Some(error) = session.error.take() {
        return Err(error);
    }
    let result = session
        .result()
        .ok_or_else(|| AppError::internal("Upload finished without a result"))?;
    print_result(&result, format);
    Ok(())
}

/// Print progress until the session ends; Ctrl-C cancels it.
async fn follow(
    mut handle: UploadHandle,
    format: OutputFormat,
) -> AppResult<UploadSession> {
    let cancel = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            output::print_warning("Cancelling upload...");
            cancel.cancel();
        }
    });

    while let Some(progress) = handle.next_progress().await {
        print_progress(&progress, format);
    }
    interrupt.abort();

    let session = handle.finish().await?;
    if !session.is_finished() {
        return Err(AppError::internal(format!(
            "Upload stopped in stage {}",
            session.stage
        )));
    }
    Ok(session)
}

fn print_progress(progress: &UploadProgress, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!(
            "[{:>3}%] {:<22} {}",
            progress.progress_percent,
            progress.stage.as_str(),
            progress.status_message
        ),
        OutputFormat::Json => match serde_json::to_string(progress) {
            Ok(line) => println!("{}", line),
            Err(_) => println!("{{}}"),
        },
    }
}

fn print_result(result: &UploadResult, format: OutputFormat) {
    let roots = result
        .root_ids
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let rows = vec![
        ("Session", result.session_id.to_string()),
        ("File", result.file_name.clone()),
        ("Size", format_bytes(result.size_bytes)),
        ("CommP", result.commp.to_string()),
        ("Destination", result.destination_id.to_string()),
        (
            "Transaction",
            result
                .transaction_hash
                .as_ref()
                .map(|h| h.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Roots", if roots.is_empty() { "-".to_string() } else { roots }),
    ];
    output::print_item(result, &rows, format);

    if format == OutputFormat::Table {
        match result.confirmation {
            Confirmation::Confirmed => output::print_success("Upload confirmed on chain."),
            Confirmation::ProviderConfirmed => {
                output::print_success("Upload confirmed by the provider.")
            }
            Confirmation::Unverified => output::print_warning(
                "No registration transaction was reported; the upload is likely stored but unverified.",
            ),
        }
    }
}
