//! Interactive confirmation of allowance top-ups.

use async_trait::async_trait;
use dialoguer::Confirm;
use tracing::warn;

use hotvault_payment::{DepositApprover, DepositPlan};

use crate::output;

/// Asks on the terminal before any deposit or approval is submitted.
#[derive(Debug, Default)]
pub struct PromptApprover;

#[async_trait]
impl DepositApprover for PromptApprover {
    async fn approve(&self, plan: &DepositPlan) -> bool {
        println!("Allowances are insufficient. Planned top-up:");
        output::print_kv("Deposit", &plan.deposit.to_token_string());
        output::print_kv("Rate allowance / epoch", &plan.rate_limit.to_token_string());
        output::print_kv("Lockup allowance", &plan.lockup_limit.to_token_string());

        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new()
                .with_prompt("Submit deposit and approval?")
                .default(false)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(e)) => {
                warn!(error = %e, "Confirmation prompt failed; treating as declined");
                false
            }
            Err(e) => {
                warn!(error = %e, "Confirmation task failed; treating as declined");
                false
            }
        }
    }
}
