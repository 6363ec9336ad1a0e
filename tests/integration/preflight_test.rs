//! Integration tests for the deposit-then-approve preflight.

use hotvault_chain::memory::ChainCall;
use hotvault_core::error::{ErrorKind, PreflightStep};
use hotvault_core::traits::ServiceApproval;
use hotvault_core::types::TokenAmount;
use hotvault_payment::PreflightOutcome;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_top_up_makes_allowances_sufficient() {
    let app = TestApp::new();
    let request = app.default_request();
    let report = app.report(&request).await;
    assert!(!report.is_sufficient);

    let outcome = app
        .ctx
        .preflight()
        .ensure_sufficient(&report, &app.ctx.client)
        .await
        .expect("preflight");

    match outcome {
        PreflightOutcome::ToppedUp {
            plan, deposit_tx, ..
        } => {
            assert_eq!(plan.deposit, report.deposit_needed);
            assert!(deposit_tx.is_some());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(app.network.escrow().funds, report.deposit_needed);

    let refreshed = app.report(&request).await;
    assert!(refreshed.is_sufficient);
    let again = app
        .ctx
        .preflight()
        .ensure_sufficient(&refreshed, &app.ctx.client)
        .await
        .expect("preflight");
    assert_eq!(again, PreflightOutcome::AlreadySufficient);
}

#[tokio::test]
async fn test_sufficient_rate_does_not_excuse_short_lockup() {
    let app = TestApp::new();
    // Rate allowance far above what 10 GiB needs; lockup lasts 5 days.
    let per_day = 1_000 * 2_880;
    app.network.set_approval(ServiceApproval {
        is_approved: true,
        rate_allowance: TokenAmount::from_tokens(1),
        rate_used: TokenAmount::from_base_units(1_000),
        lockup_allowance: TokenAmount::from_base_units(per_day * 5),
        lockup_used: TokenAmount::zero(),
    });

    let report = app.report(&app.default_request()).await;
    assert!(report.is_rate_sufficient);
    assert!(!report.is_lockup_sufficient);

    app.ctx
        .preflight()
        .ensure_sufficient(&report, &app.ctx.client)
        .await
        .expect("preflight");

    let submitted: Vec<ChainCall> = app
        .network
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ChainCall::Deposit(_) | ChainCall::Approve { .. }))
        .collect();
    assert!(matches!(submitted[0], ChainCall::Deposit(_)));
    match &submitted[1] {
        ChainCall::Approve { rate_limit, .. } => {
            assert_eq!(*rate_limit, TokenAmount::from_tokens(1));
        }
        other => panic!("expected approval, got {other:?}"),
    }
    assert!(app.report(&app.default_request()).await.is_sufficient);
}

#[tokio::test]
async fn test_empty_wallet_reports_shortfall() {
    let app = TestApp::unfunded();
    let report = app.report(&app.default_request()).await;

    let err = app
        .ctx
        .preflight()
        .ensure_sufficient(&report, &app.ctx.client)
        .await
        .expect_err("should fail");

    assert_eq!(err.kind, ErrorKind::InsufficientAllowance);
    let shortfall = err.shortfall().expect("shortfall");
    assert_eq!(shortfall.deposit, report.deposit_needed);
    assert_eq!(shortfall.failed_step, PreflightStep::BalanceCheck);
    assert!(app.deposits().is_empty());
}
