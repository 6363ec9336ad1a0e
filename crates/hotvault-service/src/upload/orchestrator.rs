//! Upload orchestrator.
//!
//! Drives one session along
//! `Init → PreflightChecked → DestinationResolving → DestinationReady →
//! Transferring → RootSubmitted → RootConfirmed → Done`, ending in `Failed`
//! on the first unrecoverable error. A failed session is never retried here;
//! the caller decides whether to start a new one.
//!
//! Cancellation stops the orchestrator at its next suspension point.
//! Transactions already submitted are not rolled back, so cancelling is
//! only side-effect free before the preflight deposit is sent.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hotvault_core::error::{AppError, ErrorKind};
use hotvault_core::events::{UploadProgress, UploadStage};
use hotvault_core::result::AppResult;
use hotvault_core::traits::ProviderEvent;
use hotvault_core::types::units::format_bytes;
use hotvault_core::types::{DestinationId, RootId, SessionId};
use hotvault_entity::{Confirmation, StorageDestination, StorageRequest, UploadSession};
use hotvault_payment::{DepositApprover, DestinationPlan, PreflightOutcome};

use crate::context::ServiceContext;
use crate::upload::progress::ProgressSink;

const PCT_PREFLIGHT_STARTED: u8 = 5;
const PCT_ALLOWANCE_CHECKED: u8 = 15;
const PCT_RESOLVING: u8 = 20;
const PCT_CREATION_STARTED: u8 = 25;
const PCT_DESTINATION_READY: u8 = 35;
const PCT_TRANSFERRING: u8 = 40;
const PCT_TRANSFER_COMPLETE: u8 = 60;
const PCT_ROOT_SUBMITTED: u8 = 75;
const PCT_ROOT_CONFIRMED: u8 = 90;
const PCT_DONE: u8 = 100;

/// A file to store.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Display name of the file.
    pub file_name: String,
    /// File contents.
    pub data: Bytes,
    /// Whether to store on a CDN-backed destination.
    pub use_cdn: bool,
}

impl UploadRequest {
    /// Creates a new upload request.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>, use_cdn: bool) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
            use_cdn,
        }
    }
}

/// A running upload started with [`UploadOrchestrator::start`].
#[derive(Debug)]
pub struct UploadHandle {
    session_id: SessionId,
    progress: mpsc::UnboundedReceiver<UploadProgress>,
    cancel: CancellationToken,
    task: JoinHandle<UploadSession>,
}

impl UploadHandle {
    /// Identifier of the session.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Next progress event; `None` once the session finished and all events were read.
    pub async fn next_progress(&mut self) -> Option<UploadProgress> {
        self.progress.recv().await
    }

    /// Abandon the session.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this session when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the session to reach `Done` or `Failed`.
    pub async fn finish(self) -> AppResult<UploadSession> {
        self.task
            .await
            .map_err(|e| AppError::internal(format!("Upload task aborted: {e}")))
    }
}

/// Runs upload sessions against one [`ServiceContext`].
#[derive(Debug, Clone)]
pub struct UploadOrchestrator {
    ctx: ServiceContext,
    approver: Option<Arc<dyn DepositApprover>>,
}

/// Session state plus where to report it.
struct Run {
    session: UploadSession,
    sink: ProgressSink,
    confirmed_roots: Option<Vec<RootId>>,
}

impl Run {
    fn advance(
        &mut self,
        stage: UploadStage,
        percent: u8,
        message: impl Into<String>,
    ) -> AppResult<()> {
        let progress = self.session.advance(stage, percent, message)?;
        self.sink.emit(progress);
        Ok(())
    }

    fn note(&mut self, percent: u8, message: impl Into<String>) {
        let progress = self.session.note(percent, message);
        self.sink.emit(progress);
    }

    /// Apply one provider notification.
    fn observe(&mut self, event: ProviderEvent) -> AppResult<()> {
        match event {
            ProviderEvent::TransferComplete { commp } => {
                let message = format!("Transfer complete ({commp})");
                self.session.commp = Some(commp);
                if self.session.stage == UploadStage::Transferring {
                    self.note(PCT_TRANSFER_COMPLETE, message);
                }
            }
            ProviderEvent::RootSubmitted { tx_hash } => {
                if self.session.stage >= UploadStage::RootSubmitted {
                    warn!(session_id = %self.session.id, "Ignoring repeated root submission");
                    return Ok(());
                }
                let message = match &tx_hash {
                    Some(tx) => format!("Root registration submitted ({tx})"),
                    None => "Root registration submitted without a transaction hash".to_string(),
                };
                self.session.transaction_hash = tx_hash;
                self.advance(UploadStage::RootSubmitted, PCT_ROOT_SUBMITTED, message)?;
            }
            ProviderEvent::RootConfirmed { root_ids } => {
                debug!(session_id = %self.session.id, roots = ?root_ids, "Provider confirmed roots");
                self.confirmed_roots = Some(root_ids);
            }
        }
        Ok(())
    }
}

impl UploadOrchestrator {
    /// Creates an orchestrator over `ctx`.
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            approver: None,
        }
    }

    /// Ask `approver` before any preflight top-up.
    pub fn with_approver(mut self, approver: Arc<dyn DepositApprover>) -> Self {
        self.approver = Some(approver);
        self
    }

    /// Start an upload in the background.
    pub fn start(&self, request: UploadRequest) -> UploadHandle {
        let (sink, progress) = ProgressSink::channel();
        let cancel = CancellationToken::new();
        let session = new_session(&request);
        let session_id = session.id;

        let orchestrator = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            orchestrator
                .run_session(session, request, sink, token)
                .await
        });

        UploadHandle {
            session_id,
            progress,
            cancel,
            task,
        }
    }

    /// Run an upload to completion.
    ///
    /// Always returns a session in `Done` or `Failed`; the terminating
    /// error, if any, is on the session.
    pub async fn run(
        &self,
        request: UploadRequest,
        sink: ProgressSink,
        cancel: CancellationToken,
    ) -> UploadSession {
        let session = new_session(&request);
        self.run_session(session, request, sink, cancel).await
    }

    async fn run_session(
        &self,
        session: UploadSession,
        request: UploadRequest,
        sink: ProgressSink,
        cancel: CancellationToken,
    ) -> UploadSession {
        let mut run = Run {
            session,
            sink,
            confirmed_roots: None,
        };
        run.sink.emit(run.session.progress());
        info!(
            session_id = %run.session.id,
            file = %request.file_name,
            size = request.data.len(),
            use_cdn = request.use_cdn,
            network = %self.ctx.network(),
            "Upload started"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::cancelled("Upload cancelled by caller")),
            result = self.drive(&mut run, &request) => result,
        };

        match outcome {
            Ok(()) => info!(
                session_id = %run.session.id,
                commp = ?run.session.commp.as_ref().map(|c| c.to_string()),
                confirmation = ?run.session.confirmation,
                "Upload finished"
            ),
            Err(e) => {
                warn!(
                    session_id = %run.session.id,
                    stage = %run.session.stage,
                    error = %e,
                    "Upload failed"
                );
                let progress = run.session.fail(e);
                run.sink.emit(progress);
            }
        }
        run.session
    }

    async fn drive(&self, run: &mut Run, request: &UploadRequest) -> AppResult<()> {
        let size = request.data.len() as u64;
        self.validate(size)?;

        run.note(PCT_PREFLIGHT_STARTED, "Checking allowances");
        let existing = self
            .ctx
            .selector()
            .resolve(&self.ctx.client, request.use_cdn)
            .await?;
        self.preflight(run, size, request.use_cdn, existing.is_none())
            .await?;

        let destination = self
            .resolve_destination(run, existing, request.use_cdn)
            .await?;
        let events = self.transfer(run, destination.id, request.data.clone()).await?;
        self.confirm(run, events).await?;

        let commp = run
            .session
            .commp
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_default();
        run.advance(
            UploadStage::Done,
            PCT_DONE,
            format!("Stored {} as {commp}", request.file_name),
        )
    }

    fn validate(&self, size: u64) -> AppResult<()> {
        let limits = &self.ctx.upload;
        if size < limits.min_file_size_bytes {
            return Err(AppError::validation(format!(
                "File is {size} bytes; the minimum is {} bytes",
                limits.min_file_size_bytes
            )));
        }
        if size > limits.max_file_size_bytes {
            return Err(AppError::validation(format!(
                "File is {}; the maximum is {}",
                format_bytes(size),
                format_bytes(limits.max_file_size_bytes)
            )));
        }
        Ok(())
    }

    /// `Init → PreflightChecked`.
    async fn preflight(
        &self,
        run: &mut Run,
        size: u64,
        use_cdn: bool,
        creates_destination: bool,
    ) -> AppResult<()> {
        let request = StorageRequest::from_config(&self.ctx.storage)?
            .with_capacity(size)?
            .with_cdn(use_cdn);
        let snapshot = self
            .ctx
            .balance_fetcher()
            .fetch_snapshot(&self.ctx.client, self.ctx.network(), size, use_cdn)
            .await?;
        let plan = if creates_destination {
            DestinationPlan::Create
        } else {
            DestinationPlan::Reuse
        };
        let report = self.ctx.metrics().compute(&request, &snapshot, plan);

        let mut gate = self.ctx.preflight();
        if let Some(approver) = &self.approver {
            gate = gate.with_approver(approver.clone());
        }
        let message = match gate.ensure_sufficient(&report, &self.ctx.client).await? {
            PreflightOutcome::AlreadySufficient => "Allowances sufficient".to_string(),
            PreflightOutcome::ToppedUp { plan, .. } => format!(
                "Deposited {} and approved the storage service",
                plan.deposit.to_token_string()
            ),
        };
        run.advance(UploadStage::PreflightChecked, PCT_ALLOWANCE_CHECKED, message)
    }

    /// `PreflightChecked → DestinationResolving → DestinationReady`.
    async fn resolve_destination(
        &self,
        run: &mut Run,
        existing: Option<StorageDestination>,
        use_cdn: bool,
    ) -> AppResult<StorageDestination> {
        run.advance(
            UploadStage::DestinationResolving,
            PCT_RESOLVING,
            "Resolving destination",
        )?;

        if let Some(destination) = existing {
            run.session.destination_id = Some(destination.id);
            run.advance(
                UploadStage::DestinationReady,
                PCT_DESTINATION_READY,
                format!("Existing destination {} resolved", destination.id),
            )?;
            return Ok(destination);
        }

        let registry = &self.ctx.collaborators.registry;
        let started = Instant::now();
        let tx = registry
            .create_destination(&self.ctx.client, use_cdn)
            .await
            .map_err(creation_failed)?;
        run.note(
            PCT_CREATION_STARTED,
            format!("Destination creation started ({tx})"),
        );

        let record = registry
            .confirm_destination(&tx)
            .await
            .map_err(creation_failed)?;
        run.session.destination_id = Some(record.id);
        run.advance(
            UploadStage::DestinationReady,
            PCT_DESTINATION_READY,
            format!(
                "Destination {} created in {:.1}s",
                record.id,
                started.elapsed().as_secs_f64()
            ),
        )?;
        Ok(StorageDestination::from(record))
    }

    /// `DestinationReady → Transferring → RootSubmitted`.
    ///
    /// Returns the provider event stream for the confirmation wait.
    async fn transfer(
        &self,
        run: &mut Run,
        destination: DestinationId,
        data: Bytes,
    ) -> AppResult<mpsc::UnboundedReceiver<ProviderEvent>> {
        run.advance(
            UploadStage::Transferring,
            PCT_TRANSFERRING,
            format!("Transferring {}", format_bytes(data.len() as u64)),
        )?;

        let (events_tx, mut events) = mpsc::unbounded_channel();
        let upload = self
            .ctx
            .collaborators
            .provider
            .upload(destination, data, events_tx);
        tokio::pin!(upload);

        let commp = loop {
            tokio::select! {
                biased;
                Some(event) = events.recv() => run.observe(event)?,
                result = &mut upload => {
                    break result.map_err(|e| {
                        AppError::wrap(
                            ErrorKind::TransferFailed,
                            format!("Transfer failed: {}", e.message),
                            e,
                        )
                    })?;
                }
            }
        };
        while let Ok(event) = events.try_recv() {
            run.observe(event)?;
        }

        if run.session.progress_percent < PCT_TRANSFER_COMPLETE {
            run.note(PCT_TRANSFER_COMPLETE, format!("Transfer complete ({commp})"));
        }
        run.session.commp = Some(commp);
        if run.session.stage < UploadStage::RootSubmitted {
            run.advance(
                UploadStage::RootSubmitted,
                PCT_ROOT_SUBMITTED,
                "Root registration submitted without a transaction hash",
            )?;
        }
        Ok(events)
    }

    /// `RootSubmitted → RootConfirmed`.
    async fn confirm(
        &self,
        run: &mut Run,
        mut events: mpsc::UnboundedReceiver<ProviderEvent>,
    ) -> AppResult<()> {
        let limits = &self.ctx.upload;

        let (confirmation, root_ids) = match run.session.transaction_hash.clone() {
            Some(tx) => {
                let watcher = &self.ctx.collaborators.watcher;
                let confirmed = &mut run.confirmed_roots;
                let wait = async {
                    let receipt = watcher.wait_for_transaction(&tx).await.map_err(|e| {
                        AppError::wrap(
                            ErrorKind::RootRegistrationFailed,
                            format!("Could not confirm root registration: {}", e.message),
                            e,
                        )
                    })?;
                    if !receipt.is_success() {
                        return Err(AppError::root_registration(format!(
                            "Root registration {tx} reverted"
                        )));
                    }
                    Ok::<_, AppError>(match confirmed.take() {
                        Some(roots) => roots,
                        None => next_confirmation(&mut events).await,
                    })
                };
                match tokio::time::timeout(limits.confirmation_timeout(), wait).await {
                    Ok(roots) => (Confirmation::Confirmed, roots?),
                    Err(_) => {
                        return Err(AppError::confirmation_timeout(format!(
                            "Root registration {tx} was not confirmed within {}s; \
                             the data was transferred but storage is unverified",
                            limits.confirmation_timeout_seconds
                        )));
                    }
                }
            }
            None => match run.confirmed_roots.take() {
                Some(roots) => (Confirmation::ProviderConfirmed, roots),
                None => {
                    warn!(
                        session_id = %run.session.id,
                        grace_period_seconds = limits.grace_period_seconds,
                        "No root-registration hash observed, waiting out the grace period"
                    );
                    tokio::select! {
                        roots = next_confirmation(&mut events) => {
                            (Confirmation::ProviderConfirmed, roots)
                        }
                        _ = tokio::time::sleep(limits.grace_period()) => {
                            (Confirmation::Unverified, Vec::new())
                        }
                    }
                }
            },
        };

        let message = match confirmation {
            Confirmation::Confirmed => "Root confirmed on-chain and by the provider".to_string(),
            Confirmation::ProviderConfirmed => "Root confirmed by the provider".to_string(),
            Confirmation::Unverified => format!(
                "Grace period of {}s elapsed; root registration is unverified",
                limits.grace_period_seconds
            ),
        };
        run.session.root_ids = root_ids;
        run.session.confirmation = Some(confirmation);
        run.advance(UploadStage::RootConfirmed, PCT_ROOT_CONFIRMED, message)
    }
}

fn new_session(request: &UploadRequest) -> UploadSession {
    UploadSession::new(
        request.file_name.clone(),
        request.data.len() as u64,
        request.use_cdn,
    )
}

fn creation_failed(err: AppError) -> AppError {
    AppError::wrap(
        ErrorKind::DestinationCreationFailed,
        format!("Destination creation failed: {}", err.message),
        err,
    )
}

/// Root ids from the next provider confirmation.
///
/// Pends forever once the provider stream closes, leaving the caller's
/// timeout or grace period to end the wait.
async fn next_confirmation(events: &mut mpsc::UnboundedReceiver<ProviderEvent>) -> Vec<RootId> {
    while let Some(event) = events.recv().await {
        match event {
            ProviderEvent::RootConfirmed { root_ids } => return root_ids,
            other => debug!(event = ?other, "Ignoring late provider event"),
        }
    }
    std::future::pending().await
}
