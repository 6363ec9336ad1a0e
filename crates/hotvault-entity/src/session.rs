//! Upload session state owned by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotvault_core::error::{AppError, ErrorKind};
use hotvault_core::events::{UploadProgress, UploadStage};
use hotvault_core::result::AppResult;
use hotvault_core::types::{DestinationId, PieceCid, RootId, SessionId, TxHash};

/// How the root registration was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    /// The registration transaction was mined and the provider confirmed the root.
    Confirmed,
    /// No transaction hash was surfaced, but the provider confirmed the root.
    ProviderConfirmed,
    /// No transaction hash was surfaced and the grace period elapsed.
    /// The transfer likely succeeded but nothing verified it.
    Unverified,
}

/// Final result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Session that produced the result.
    pub session_id: SessionId,
    /// Name of the uploaded file.
    pub file_name: String,
    /// Size of the uploaded payload.
    pub size_bytes: u64,
    /// Piece commitment returned by the provider.
    pub commp: PieceCid,
    /// Root-registration transaction, if one was observed.
    pub transaction_hash: Option<TxHash>,
    /// Destination the piece was appended to.
    pub destination_id: DestinationId,
    /// Root ids the provider assigned, if it confirmed.
    pub root_ids: Vec<RootId>,
    /// How the registration was confirmed.
    pub confirmation: Confirmation,
}

/// Mutable state of one upload.
///
/// Stages only move forward and `progress_percent` never decreases.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Session identifier.
    pub id: SessionId,
    /// Name of the file being uploaded.
    pub file_name: String,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Whether a CDN-backed destination was requested.
    pub with_cdn: bool,
    /// Current stage.
    pub stage: UploadStage,
    /// Progress, 0-100.
    pub progress_percent: u8,
    /// Human-readable status of the last completed step.
    pub status_message: String,
    /// Destination in use, once resolved.
    pub destination_id: Option<DestinationId>,
    /// Piece commitment, once the transfer completed.
    pub commp: Option<PieceCid>,
    /// Root-registration transaction, once observed.
    pub transaction_hash: Option<TxHash>,
    /// Root ids, once the provider confirmed.
    pub root_ids: Vec<RootId>,
    /// Confirmation mode, once `RootConfirmed` is reached.
    pub confirmation: Option<Confirmation>,
    /// Terminating error, if the session failed.
    pub error: Option<AppError>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the session reached a terminal stage.
    pub finished_at: Option<DateTime<Utc>>,
}

impl UploadSession {
    /// Create a session in the `Init` stage.
    pub fn new(file_name: impl Into<String>, size_bytes: u64, with_cdn: bool) -> Self {
        Self {
            id: SessionId::new(),
            file_name: file_name.into(),
            size_bytes,
            with_cdn,
            stage: UploadStage::Init,
            progress_percent: 0,
            status_message: "Upload created".to_string(),
            destination_id: None,
            commp: None,
            transaction_hash: None,
            root_ids: Vec::new(),
            confirmation: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to `stage`, raising progress to at least `percent`.
    pub fn advance(
        &mut self,
        stage: UploadStage,
        percent: u8,
        message: impl Into<String>,
    ) -> AppResult<UploadProgress> {
        if !self.stage.can_advance_to(stage) {
            return Err(AppError::internal(format!(
                "Illegal upload transition {} -> {}",
                self.stage, stage
            )));
        }
        self.stage = stage;
        if stage.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(self.note(percent, message))
    }

    /// Record progress within the current stage.
    pub fn note(&mut self, percent: u8, message: impl Into<String>) -> UploadProgress {
        self.progress_percent = self.progress_percent.max(percent.min(100));
        self.status_message = message.into();
        self.progress()
    }

    /// Terminate the session with `error`. Progress is left where it was.
    pub fn fail(&mut self, error: AppError) -> UploadProgress {
        let message = format!(
            "Failed while {}: {}",
            describe_stage(self.stage),
            error.message
        );
        if !self.stage.is_terminal() {
            self.stage = UploadStage::Failed;
            self.finished_at = Some(Utc::now());
        }
        self.error = Some(error);
        self.note(self.progress_percent, message)
    }

    /// Current state as a progress event.
    pub fn progress(&self) -> UploadProgress {
        UploadProgress {
            session_id: self.id,
            stage: self.stage,
            progress_percent: self.progress_percent,
            status_message: self.status_message.clone(),
            at: Utc::now(),
        }
    }

    /// Whether the session reached `Done` or `Failed`.
    pub fn is_finished(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Kind of the terminating error, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// The final result, available once the session is `Done`.
    pub fn result(&self) -> Option<UploadResult> {
        if self.stage != UploadStage::Done {
            return None;
        }
        Some(UploadResult {
            session_id: self.id,
            file_name: self.file_name.clone(),
            size_bytes: self.size_bytes,
            commp: self.commp.clone()?,
            transaction_hash: self.transaction_hash.clone(),
            destination_id: self.destination_id?,
            root_ids: self.root_ids.clone(),
            confirmation: self.confirmation?,
        })
    }
}

fn describe_stage(stage: UploadStage) -> &'static str {
    match stage {
        UploadStage::Init => "checking allowances",
        UploadStage::PreflightChecked | UploadStage::DestinationResolving => {
            "resolving the destination"
        }
        UploadStage::DestinationReady | UploadStage::Transferring => "transferring data",
        UploadStage::RootSubmitted => "confirming root registration",
        UploadStage::RootConfirmed => "finishing",
        UploadStage::Done | UploadStage::Failed => "finished",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_never_decreases() {
        let mut session = UploadSession::new("a.bin", 100, false);
        session
            .advance(UploadStage::PreflightChecked, 15, "ok")
            .expect("advance");
        session.note(5, "late event");
        assert_eq!(session.progress_percent, 15);
    }

    fn walk_to(session: &mut UploadSession, target: UploadStage) {
        while session.stage != target {
            let next = session.stage.successor().expect("target lies ahead");
            session.advance(next, 0, next.as_str()).expect("advance");
        }
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut session = UploadSession::new("a.bin", 100, false);
        walk_to(&mut session, UploadStage::Transferring);
        assert!(session.advance(UploadStage::DestinationReady, 35, "back").is_err());
        assert_eq!(session.stage, UploadStage::Transferring);
    }

    #[test]
    fn test_skipping_to_done_rejected() {
        let mut session = UploadSession::new("a.bin", 100, false);
        let err = session
            .advance(UploadStage::Done, 100, "done")
            .expect_err("skip");
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(session.stage, UploadStage::Init);
        assert_eq!(session.progress_percent, 0);
        assert!(!session.is_finished());

        walk_to(&mut session, UploadStage::Transferring);
        assert!(session.advance(UploadStage::RootConfirmed, 90, "early").is_err());
        assert_eq!(session.stage, UploadStage::Transferring);
    }

    #[test]
    fn test_fail_keeps_progress_and_error() {
        let mut session = UploadSession::new("a.bin", 100, false);
        walk_to(&mut session, UploadStage::Transferring);
        session.note(40, "sending");
        let event = session.fail(AppError::transfer("provider hung up"));
        assert_eq!(event.stage, UploadStage::Failed);
        assert_eq!(event.progress_percent, 40);
        assert!(event.status_message.contains("transferring data"));
        assert_eq!(session.error_kind(), Some(ErrorKind::TransferFailed));
        assert!(session.is_finished());
        assert!(session.result().is_none());
    }

    #[test]
    fn test_result_requires_done() {
        let mut session = UploadSession::new("a.bin", 100, false);
        session.destination_id = Some(DestinationId(7));
        session.commp = Some(PieceCid::parse("baga6ea4seaqtest").expect("cid"));
        session.confirmation = Some(Confirmation::Unverified);
        walk_to(&mut session, UploadStage::RootConfirmed);
        assert!(session.result().is_none());
        assert!(!session.is_finished());
        session.advance(UploadStage::Done, 100, "done").expect("advance");
        assert!(session.is_finished());
        let result = session.result().expect("result");
        assert_eq!(result.destination_id, DestinationId(7));
        assert!(result.transaction_hash.is_none());
    }
}
