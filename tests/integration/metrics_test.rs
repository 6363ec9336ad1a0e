//! Integration tests for balance reads and sufficiency reports.

use hotvault_core::error::ErrorKind;
use hotvault_core::traits::ServiceApproval;
use hotvault_core::types::TokenAmount;
use hotvault_core::types::units::GIB;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_fresh_client_is_insufficient() {
    let app = TestApp::new();
    let request = app.default_request();
    assert_eq!(request.capacity_bytes, 10 * GIB);

    let report = app.report(&request).await;

    assert_eq!(report.rate_needed, TokenAmount::from_base_units(226_056_134_259));
    assert_eq!(
        report.lockup_per_day,
        TokenAmount::from_base_units(651_041_666_665_920)
    );
    assert_eq!(report.lockup_needed, TokenAmount::from_u128(19_531_249_999_977_600));
    assert!(!report.is_rate_sufficient);
    assert!(!report.is_lockup_sufficient);
    assert!(!report.is_sufficient);
}

#[tokio::test]
async fn test_asking_for_less_than_the_runway_costs_nothing() {
    let app = TestApp::new();
    // 1000 units/epoch charged, 40 days of lockup left.
    let per_day = 1_000 * 2_880;
    app.network.set_approval(ServiceApproval {
        is_approved: true,
        rate_allowance: TokenAmount::from_tokens(1),
        rate_used: TokenAmount::from_base_units(1_000),
        lockup_allowance: TokenAmount::from_base_units(per_day * 40),
        lockup_used: TokenAmount::zero(),
    });

    let report = app.report(&app.default_request()).await;

    assert!((report.persistence_days_left - 40.0).abs() < 1e-9);
    assert!(report.lockup_needed.is_zero());
    assert!(report.is_sufficient);
}

#[tokio::test]
async fn test_balance_sheet_reflects_wallet_and_escrow() {
    let app = TestApp::new();
    let sheet = app
        .ctx
        .balance_fetcher()
        .fetch(&app.ctx.client, "devnet", 10 * GIB, false)
        .await
        .expect("sheet");

    assert_eq!(sheet.network, "devnet");
    assert_eq!(sheet.wallet_balance, TokenAmount::from_tokens(10));
    assert!(sheet.escrow.funds.is_zero());
    assert!(!sheet.service_approved);
    assert_eq!(
        sheet.snapshot.rate_allowance_needed,
        TokenAmount::from_base_units(226_056_134_259)
    );
}

#[tokio::test]
async fn test_unknown_network_fails_before_any_call() {
    let app = TestApp::new();
    let err = app
        .ctx
        .balance_fetcher()
        .fetch(&app.ctx.client, "mainnet", 10 * GIB, false)
        .await
        .expect_err("should fail");

    assert_eq!(err.kind, ErrorKind::InvalidNetwork);
    assert!(app.network.calls().is_empty());
}

#[tokio::test]
async fn test_unreachable_node_is_retryable() {
    let app = TestApp::new();
    app.network.fail_reads(true);

    let err = app
        .ctx
        .balance_fetcher()
        .fetch_snapshot(&app.ctx.client, "devnet", GIB, false)
        .await
        .expect_err("should fail");

    assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
    assert!(err.kind.is_retryable());
}
