//! Upload session stages and progress notifications.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// Stage of an upload session.
///
/// Sessions move forward only. `Failed` is reachable from every
/// non-terminal stage; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    /// Session created, nothing checked yet.
    Init,
    /// Allowances are sufficient (possibly after a top-up).
    PreflightChecked,
    /// Looking up or creating the destination.
    DestinationResolving,
    /// A destination is available for appending.
    DestinationReady,
    /// Bytes are being handed to the provider.
    Transferring,
    /// The root-registration transaction was submitted.
    RootSubmitted,
    /// The root registration is confirmed (or the grace period elapsed).
    RootConfirmed,
    /// The upload finished.
    Done,
    /// The upload terminated with an error.
    Failed,
}

impl UploadStage {
    /// Return the stage as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::PreflightChecked => "preflight_checked",
            Self::DestinationResolving => "destination_resolving",
            Self::DestinationReady => "destination_ready",
            Self::Transferring => "transferring",
            Self::RootSubmitted => "root_submitted",
            Self::RootConfirmed => "root_confirmed",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The stage that follows `self` on the success path.
    pub fn successor(&self) -> Option<UploadStage> {
        match self {
            Self::Init => Some(Self::PreflightChecked),
            Self::PreflightChecked => Some(Self::DestinationResolving),
            Self::DestinationResolving => Some(Self::DestinationReady),
            Self::DestinationReady => Some(Self::Transferring),
            Self::Transferring => Some(Self::RootSubmitted),
            Self::RootSubmitted => Some(Self::RootConfirmed),
            Self::RootConfirmed => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Only the immediate successor or `Failed` is accepted; stages are
    /// never skipped.
    pub fn can_advance_to(&self, next: UploadStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Failed || self.successor() == Some(next)
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A progress notification for one upload session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadProgress {
    /// The session this event belongs to.
    pub session_id: SessionId,
    /// Stage at the time of the event.
    pub stage: UploadStage,
    /// Progress percentage, 0-100, non-decreasing within a session.
    pub progress_percent: u8,
    /// Human-readable status; informational only.
    pub status_message: String,
    /// When the event was produced.
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        assert!(UploadStage::Init.can_advance_to(UploadStage::PreflightChecked));
        assert!(UploadStage::Transferring.can_advance_to(UploadStage::RootSubmitted));
        assert!(!UploadStage::RootSubmitted.can_advance_to(UploadStage::Transferring));
        assert!(!UploadStage::Transferring.can_advance_to(UploadStage::Transferring));
    }

    #[test]
    fn test_skipping_stages_rejected() {
        assert!(!UploadStage::Transferring.can_advance_to(UploadStage::RootConfirmed));
        assert!(!UploadStage::Init.can_advance_to(UploadStage::Done));
        assert!(!UploadStage::PreflightChecked.can_advance_to(UploadStage::DestinationReady));
        assert!(!UploadStage::RootSubmitted.can_advance_to(UploadStage::Done));
    }

    #[test]
    fn test_success_path_walks_every_stage() {
        let mut stage = UploadStage::Init;
        let mut visited = vec![stage];
        while let Some(next) = stage.successor() {
            assert!(stage.can_advance_to(next));
            stage = next;
            visited.push(stage);
        }
        assert_eq!(stage, UploadStage::Done);
        assert_eq!(visited.len(), 8);
        assert!(visited.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        assert!(UploadStage::Init.can_advance_to(UploadStage::Failed));
        assert!(UploadStage::RootConfirmed.can_advance_to(UploadStage::Failed));
        assert!(!UploadStage::Done.can_advance_to(UploadStage::Failed));
        assert!(!UploadStage::Failed.can_advance_to(UploadStage::Done));
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&UploadStage::RootSubmitted).expect("serialize");
        assert_eq!(json, "\"root_submitted\"");
    }
}
