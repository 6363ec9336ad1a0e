//! Integration tests for upload sessions.

use hotvault_chain::memory::{ChainCall, Faults};
use hotvault_core::error::ErrorKind;
use hotvault_core::events::UploadStage;
use hotvault_core::types::ProviderId;
use hotvault_entity::Confirmation;

use crate::helpers::TestApp;

#[tokio::test(start_paused = true)]
async fn test_first_upload_tops_up_and_creates_destination() {
    let app = TestApp::new();

    let (session, events) = app.upload(4096, false).await;

    assert_eq!(session.stage, UploadStage::Done, "{:?}", session.error);
    assert_eq!(app.creations(), 1);
    assert_eq!(app.deposits().len(), 1);
    let result = session.result().expect("result");
    assert_eq!(result.size_bytes, 4096);
    assert_eq!(result.confirmation, Confirmation::Confirmed);
    assert!(result.transaction_hash.is_some());

    assert_eq!(events.first().map(|e| e.stage), Some(UploadStage::Init));
    assert_eq!(events.last().map(|e| e.progress_percent), Some(100));
    for pair in events.windows(2) {
        assert!(pair[0].progress_percent <= pair[1].progress_percent);
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_upload_appends_without_paying_again() {
    let app = TestApp::new();
    let (first, _) = app.upload(1024, false).await;
    let (second, _) = app.upload(2048, false).await;

    assert_eq!(second.stage, UploadStage::Done, "{:?}", second.error);
    assert_eq!(first.destination_id, second.destination_id);
    assert_eq!(app.creations(), 1);
    assert_eq!(app.deposits().len(), 1);

    let destination = app
        .network
        .destinations()
        .into_iter()
        .find(|d| Some(d.id) == second.destination_id)
        .expect("destination");
    assert_eq!(destination.current_piece_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_cdn_upload_ignores_busier_plain_destination() {
    let app = TestApp::new();
    let plain = app.network.add_destination(false, 50, Some(ProviderId(3)));
    let cdn = app.network.add_destination(true, 5, Some(ProviderId(4)));

    let (session, _) = app.upload(1024, true).await;

    assert_eq!(session.stage, UploadStage::Done, "{:?}", session.error);
    assert_eq!(session.destination_id, Some(cdn));
    assert_ne!(session.destination_id, Some(plain));
    assert_eq!(app.creations(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unobserved_registration_completes_unverified() {
    let app = TestApp::new();
    app.network.set_faults(Faults {
        omit_root_tx_hash: true,
        withhold_root_confirmation: true,
        ..Faults::default()
    });

    let (session, events) = app.upload(1024, false).await;

    assert_eq!(session.stage, UploadStage::Done, "{:?}", session.error);
    let result = session.result().expect("result");
    assert_eq!(result.transaction_hash, None);
    assert_eq!(result.confirmation, Confirmation::Unverified);
    assert!(events.iter().any(|e| e.stage == UploadStage::RootConfirmed));
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_error_kind_and_stops_machine() {
    let app = TestApp::new();
    app.network.update_faults(|f| f.fail_transfer = true);

    let (session, events) = app.upload(1024, false).await;

    assert_eq!(session.stage, UploadStage::Failed);
    assert_eq!(session.error_kind(), Some(ErrorKind::TransferFailed));
    assert!(session.result().is_none());
    let last = events.last().expect("events");
    assert_eq!(last.stage, UploadStage::Failed);
    assert!(!events.iter().any(|e| e.stage == UploadStage::RootSubmitted));
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_provider_recovers_reuses_destination() {
    let app = TestApp::new();
    app.network.set_faults(Faults {
        fail_transfer: true,
        ..Faults::default()
    });
    let (failed, _) = app.upload(1024, false).await;
    assert_eq!(failed.error_kind(), Some(ErrorKind::TransferFailed));
    assert_eq!(app.creations(), 1);

    app.network.set_faults(Faults::default());
    let (retried, _) = app.upload(1024, false).await;

    assert_eq!(retried.stage, UploadStage::Done, "{:?}", retried.error);
    assert_eq!(retried.destination_id, failed.destination_id);
    assert_eq!(app.creations(), 1);
    assert_eq!(app.deposits().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unfunded_upload_fails_in_preflight() {
    let app = TestApp::unfunded();

    let (session, _) = app.upload(1024, false).await;

    assert_eq!(session.stage, UploadStage::Failed);
    assert_eq!(session.error_kind(), Some(ErrorKind::InsufficientAllowance));
    assert_eq!(app.creations(), 0);
    assert!(
        !app.network
            .calls()
            .iter()
            .any(|c| matches!(c, ChainCall::Upload { .. }))
    );
}
