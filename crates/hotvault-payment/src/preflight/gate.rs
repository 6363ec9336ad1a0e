//! Deposit-then-approve preflight.
//!
//! The deposit is always mined before the approval is submitted, so a
//! spending rate the escrow cannot cover is never approved.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hotvault_core::config::NetworkContracts;
use hotvault_core::error::{AppError, PreflightStep, Shortfall};
use hotvault_core::result::AppResult;
use hotvault_core::traits::{PaymentService, TransactionWatcher};
use hotvault_core::types::{Address, TokenAmount, TxHash};
use hotvault_entity::SufficiencyReport;

/// Amounts a top-up will put in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPlan {
    /// Amount deposited into escrow.
    pub deposit: TokenAmount,
    /// Rate allowance approved per epoch.
    pub rate_limit: TokenAmount,
    /// Total lockup allowance approved.
    pub lockup_limit: TokenAmount,
}

impl DepositPlan {
    /// Plan the top-up for an insufficient report.
    ///
    /// Limits never drop below what is already approved.
    pub fn for_report(report: &SufficiencyReport) -> Self {
        Self {
            deposit: report.deposit_needed,
            rate_limit: report.rate_needed.max(report.rate_allowance_current),
            lockup_limit: report.deposit_needed.max(report.lockup_allowance_current),
        }
    }

    fn shortfall(&self, failed_step: PreflightStep) -> Shortfall {
        Shortfall {
            deposit: self.deposit,
            rate_limit: self.rate_limit,
            lockup_limit: self.lockup_limit,
            failed_step,
        }
    }
}

/// Asks whether a planned top-up may be submitted.
#[async_trait]
pub trait DepositApprover: Send + Sync + std::fmt::Debug + 'static {
    /// Return `true` to proceed with the plan.
    async fn approve(&self, plan: &DepositPlan) -> bool;
}

/// What the gate did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightOutcome {
    /// Allowances already covered the request; nothing was submitted.
    AlreadySufficient,
    /// A top-up was mined.
    ToppedUp {
        /// The amounts put in place.
        plan: DepositPlan,
        /// Deposit transaction, absent when nothing had to be deposited.
        deposit_tx: Option<TxHash>,
        /// Approval transaction.
        approval_tx: TxHash,
    },
}

/// Ensures allowances are sufficient before an upload starts.
#[derive(Debug, Clone)]
pub struct PreflightGate {
    payments: Arc<dyn PaymentService>,
    watcher: Arc<dyn TransactionWatcher>,
    contracts: NetworkContracts,
    approver: Option<Arc<dyn DepositApprover>>,
}

impl PreflightGate {
    /// Creates a gate for one network.
    pub fn new(
        payments: Arc<dyn PaymentService>,
        watcher: Arc<dyn TransactionWatcher>,
        contracts: NetworkContracts,
    ) -> Self {
        Self {
            payments,
            watcher,
            contracts,
            approver: None,
        }
    }

    /// Ask `approver` before submitting any transaction.
    pub fn with_approver(mut self, approver: Arc<dyn DepositApprover>) -> Self {
        self.approver = Some(approver);
        self
    }

    /// Bring `client`'s allowances to sufficiency for `report`.
    ///
    /// No-op when the report is sufficient. Otherwise checks the wallet,
    /// deposits, then approves, each step waiting for its receipt.
    ///
    /// Short lockup with nothing to deposit cannot be repaired and fails at
    /// the deposit step without submitting anything.
    pub async fn ensure_sufficient(
        &self,
        report: &SufficiencyReport,
        client: &Address,
    ) -> AppResult<PreflightOutcome> {
        if report.is_sufficient {
            return Ok(PreflightOutcome::AlreadySufficient);
        }

        let plan = DepositPlan::for_report(report);
        if !report.is_lockup_sufficient && plan.deposit.is_zero() {
            return Err(fail(
                &plan,
                PreflightStep::Deposit,
                format!(
                    "runway of {:.1} days is below the threshold but no deposit would raise it",
                    report.persistence_days_left
                ),
            ));
        }

        info!(
            client = %client,
            deposit = %plan.deposit.to_token_string(),
            rate_limit = %plan.rate_limit,
            lockup_limit = %plan.lockup_limit.to_token_string(),
            rate_ok = report.is_rate_sufficient,
            lockup_ok = report.is_lockup_sufficient,
            "Allowances insufficient, topping up"
        );

        if let Some(approver) = &self.approver
            && !approver.approve(&plan).await
        {
            return Err(AppError::cancelled("Deposit declined"));
        }

        let deposit_tx = if plan.deposit.is_zero() {
            None
        } else {
            self.check_wallet(&plan, client).await?;
            let tx = self
                .submit(&plan, PreflightStep::Deposit, async {
                    self.payments
                        .deposit(&self.contracts.token, plan.deposit)
                        .await
                })
                .await?;
            Some(tx)
        };

        let approval_tx = self
            .submit(&plan, PreflightStep::Approval, async {
                self.payments
                    .approve_service(
                        &self.contracts.token,
                        &self.contracts.storage_service,
                        plan.rate_limit,
                        plan.lockup_limit,
                    )
                    .await
            })
            .await?;

        info!(
            deposit_tx = ?deposit_tx.as_ref().map(TxHash::as_str),
            approval_tx = %approval_tx,
            "Preflight top-up confirmed"
        );

        Ok(PreflightOutcome::ToppedUp {
            plan,
            deposit_tx,
            approval_tx,
        })
    }

    async fn check_wallet(&self, plan: &DepositPlan, client: &Address) -> AppResult<()> {
        let balance = self
            .payments
            .wallet_balance(&self.contracts.token, client)
            .await
            .map_err(|e| fail(plan, PreflightStep::BalanceCheck, e.message))?;
        if balance < plan.deposit {
            return Err(fail(
                plan,
                PreflightStep::BalanceCheck,
                format!(
                    "wallet holds {} but {} is needed",
                    balance.to_token_string(),
                    plan.deposit.to_token_string()
                ),
            ));
        }
        Ok(())
    }

    /// Submit one transaction and wait for a successful receipt.
    async fn submit(
        &self,
        plan: &DepositPlan,
        step: PreflightStep,
        send: impl Future<Output = AppResult<TxHash>>,
    ) -> AppResult<TxHash> {
        let tx = send.await.map_err(|e| fail(plan, step, e.message))?;
        info!(step = %step, tx = %tx, "Submitted preflight transaction");

        let receipt = self
            .watcher
            .wait_for_transaction(&tx)
            .await
            .map_err(|e| fail(plan, step, e.message))?;
        if !receipt.is_success() {
            return Err(fail(plan, step, format!("transaction {tx} reverted")));
        }
        Ok(tx)
    }
}

fn fail(plan: &DepositPlan, step: PreflightStep, reason: impl std::fmt::Display) -> AppError {
    warn!(step = %step, reason = %reason, "Preflight failed");
    AppError::insufficient_allowance(
        format!("Preflight {step} failed: {reason}"),
        plan.shortfall(step),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::StorageMetricsCalculator;
    use hotvault_chain::memory::{ChainCall, MemoryNetwork, devnet_contracts};
    use hotvault_core::error::ErrorKind;
    use hotvault_core::types::units::{EPOCHS_PER_DAY, GIB};
    use hotvault_entity::{AllowanceSnapshot, StorageRequest};

    fn gate(network: &MemoryNetwork) -> PreflightGate {
        PreflightGate::new(
            Arc::new(network.clone()),
            Arc::new(network.clone()),
            devnet_contracts(),
        )
    }

    fn report(snapshot: &AllowanceSnapshot) -> SufficiencyReport {
        let request = StorageRequest::new(10 * GIB, 30, 10, false).expect("request");
        StorageMetricsCalculator::default().compute_metrics(&request, snapshot)
    }

    #[derive(Debug)]
    struct Decline;

    #[async_trait]
    impl DepositApprover for Decline {
        async fn approve(&self, _plan: &DepositPlan) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_sufficient_report_is_noop() {
        let network = MemoryNetwork::new();
        let snapshot = AllowanceSnapshot {
            rate_allowance_current: TokenAmount::from_tokens(1),
            lockup_allowance_current: TokenAmount::from_tokens(1),
            ..AllowanceSnapshot::default()
        };
        let outcome = gate(&network)
            .ensure_sufficient(&report(&snapshot), &network.client())
            .await
            .expect("preflight");
        assert_eq!(outcome, PreflightOutcome::AlreadySufficient);
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deposit_mined_before_approval() {
        let network = MemoryNetwork::new();
        network.fund_wallet(TokenAmount::from_tokens(100));
        let report = report(&AllowanceSnapshot::default());

        let outcome = gate(&network)
            .ensure_sufficient(&report, &network.client())
            .await
            .expect("preflight");

        let PreflightOutcome::ToppedUp { plan, deposit_tx, .. } = outcome else {
            panic!("expected a top-up");
        };
        assert!(deposit_tx.is_some());
        assert_eq!(plan.deposit, report.deposit_needed);
        assert_eq!(plan.rate_limit, report.rate_needed);

        let writes: Vec<_> = network
            .calls()
            .into_iter()
            .filter(|c| c.is_transaction())
            .collect();
        assert!(matches!(
            writes.as_slice(),
            [ChainCall::Deposit(_), ChainCall::Wait(_), ChainCall::Approve { .. }, ChainCall::Wait(_)]
        ));
    }

    #[tokio::test]
    async fn test_rate_ok_lockup_short_still_tops_up() {
        let network = MemoryNetwork::new();
        network.fund_wallet(TokenAmount::from_tokens(100));
        let rate = TokenAmount::from_base_units(226_056_134_259);
        let snapshot = AllowanceSnapshot {
            rate_allowance_current: rate.saturating_mul_u64(2),
            rate_used: rate,
            lockup_allowance_current: rate.saturating_mul_u64(EPOCHS_PER_DAY * 5),
            lockup_used: TokenAmount::zero(),
            rate_allowance_needed: rate,
        };
        let report = report(&snapshot);
        assert!(report.is_rate_sufficient);
        assert!(!report.is_lockup_sufficient);

        let outcome = gate(&network)
            .ensure_sufficient(&report, &network.client())
            .await
            .expect("preflight");

        let PreflightOutcome::ToppedUp { plan, .. } = outcome else {
            panic!("expected a top-up");
        };
        // The existing, larger rate allowance is kept.
        assert_eq!(plan.rate_limit, rate.saturating_mul_u64(2));
        assert!(network.calls().iter().any(|c| matches!(c, ChainCall::Deposit(_))));
        assert!(network.calls().iter().any(|c| matches!(c, ChainCall::Approve { .. })));
    }

    #[tokio::test]
    async fn test_short_lockup_without_deposit_fails() {
        let network = MemoryNetwork::new();
        network.fund_wallet(TokenAmount::from_tokens(100));
        let rate = TokenAmount::from_base_units(226_056_134_259);
        // 35 days of runway: enough for 30 days of persistence, short of a 40 day threshold.
        let snapshot = AllowanceSnapshot {
            rate_allowance_current: rate.saturating_mul_u64(2),
            rate_used: rate,
            lockup_allowance_current: rate.saturating_mul_u64(EPOCHS_PER_DAY * 35),
            lockup_used: TokenAmount::zero(),
            rate_allowance_needed: rate,
        };
        let request = StorageRequest {
            capacity_bytes: 10 * GIB,
            persistence_days: 30,
            min_days_threshold: 40,
            use_cdn: false,
        };
        let report = StorageMetricsCalculator::default().compute_metrics(&request, &snapshot);
        assert!(!report.is_lockup_sufficient);
        assert!(report.deposit_needed.is_zero());

        let err = gate(&network)
            .ensure_sufficient(&report, &network.client())
            .await
            .expect_err("nothing can be topped up");

        assert_eq!(err.kind, ErrorKind::InsufficientAllowance);
        let shortfall = err.shortfall().expect("shortfall");
        assert_eq!(shortfall.failed_step, PreflightStep::Deposit);
        assert!(shortfall.deposit.is_zero());
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_wallet_submits_nothing() {
        let network = MemoryNetwork::new();
        let err = gate(&network)
            .ensure_sufficient(&report(&AllowanceSnapshot::default()), &network.client())
            .await
            .expect_err("should fail");

        assert_eq!(err.kind, ErrorKind::InsufficientAllowance);
        let shortfall = err.shortfall().expect("shortfall");
        assert_eq!(shortfall.failed_step, PreflightStep::BalanceCheck);
        assert!(!network.calls().iter().any(|c| c.is_transaction()));
    }

    #[tokio::test]
    async fn test_reverted_deposit_never_approves() {
        let network = MemoryNetwork::new();
        network.fund_wallet(TokenAmount::from_tokens(100));
        network.revert_deposits(true);

        let err = gate(&network)
            .ensure_sufficient(&report(&AllowanceSnapshot::default()), &network.client())
            .await
            .expect_err("should fail");

        assert_eq!(
            err.shortfall().map(|s| s.failed_step),
            Some(PreflightStep::Deposit)
        );
        assert!(!network.calls().iter().any(|c| matches!(c, ChainCall::Approve { .. })));
    }

    #[tokio::test]
    async fn test_declined_plan_is_cancelled() {
        let network = MemoryNetwork::new();
        network.fund_wallet(TokenAmount::from_tokens(100));
        let err = gate(&network)
            .with_approver(Arc::new(Decline))
            .ensure_sufficient(&report(&AllowanceSnapshot::default()), &network.client())
            .await
            .expect_err("should fail");
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(network.calls().is_empty());
    }
}
