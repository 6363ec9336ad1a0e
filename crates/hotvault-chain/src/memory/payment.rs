//! Simulated payments contract.

use async_trait::async_trait;
use primitive_types::U256;
use tracing::info;

use hotvault_core::error::AppError;
use hotvault_core::result::AppResult;
use hotvault_core::traits::{EscrowAccount, PaymentService, ServiceApproval, TxStatus};
use hotvault_core::types::units::{EPOCHS_PER_MONTH, TIB};
use hotvault_core::types::{Address, TokenAmount, TxHash};

use super::network::{ChainCall, MemoryNetwork};

impl MemoryNetwork {
    fn check_reads(&self) -> AppResult<()> {
        if self.faults().fail_reads {
            return Err(AppError::external("memory node unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentService for MemoryNetwork {
    async fn wallet_balance(&self, _token: &Address, owner: &Address) -> AppResult<TokenAmount> {
        self.record(ChainCall::WalletBalance);
        self.check_reads()?;
        let state = self.lock();
        Ok(if state.owns(owner) {
            state.wallet
        } else {
            TokenAmount::zero()
        })
    }

    async fn escrow_account(&self, _token: &Address, owner: &Address) -> AppResult<EscrowAccount> {
        self.record(ChainCall::EscrowAccount);
        self.check_reads()?;
        let state = self.lock();
        Ok(if state.owns(owner) {
            state.escrow.clone()
        } else {
            EscrowAccount::default()
        })
    }

    async fn service_approval(
        &self,
        owner: &Address,
        _spender: &Address,
    ) -> AppResult<ServiceApproval> {
        self.record(ChainCall::ServiceApproval);
        self.check_reads()?;
        let state = self.lock();
        Ok(if state.owns(owner) {
            state.approval.clone()
        } else {
            ServiceApproval::default()
        })
    }

    async fn rate_allowance_needed(
        &self,
        capacity_bytes: u64,
        with_cdn: bool,
    ) -> AppResult<TokenAmount> {
        self.record(ChainCall::RateAllowanceNeeded);
        self.check_reads()?;
        let monthly = self.lock().prices.per_tib_per_month(with_cdn).as_u256();
        let per_epoch = monthly / U256::from(EPOCHS_PER_MONTH);
        let rate = U256::from(capacity_bytes).saturating_mul(per_epoch) / U256::from(TIB);
        Ok(TokenAmount::from_u256(rate))
    }

    async fn deposit(&self, _token: &Address, amount: TokenAmount) -> AppResult<TxHash> {
        self.record(ChainCall::Deposit(amount));
        let revert = self.faults().revert_deposits;
        let mut state = self.lock();
        if revert || state.wallet < amount {
            return Ok(state.mine(TxStatus::Reverted));
        }
        state.wallet = state.wallet.saturating_sub(amount);
        state.escrow.funds = state.escrow.funds.saturating_add(amount);
        state.escrow.available_funds = state.escrow.available_funds.saturating_add(amount);
        let tx = state.mine(TxStatus::Success);
        info!(amount = %amount, tx = %tx, "[MemoryNetwork] Deposit mined");
        Ok(tx)
    }

    async fn approve_service(
        &self,
        _token: &Address,
        _spender: &Address,
        rate_limit: TokenAmount,
        lockup_limit: TokenAmount,
    ) -> AppResult<TxHash> {
        self.record(ChainCall::Approve {
            rate_limit,
            lockup_limit,
        });
        let revert = self.faults().revert_approvals;
        let mut state = self.lock();
        if revert {
            return Ok(state.mine(TxStatus::Reverted));
        }
        state.approval.is_approved = true;
        state.approval.rate_allowance = rate_limit;
        state.approval.lockup_allowance = lockup_limit;
        let tx = state.mine(TxStatus::Success);
        info!(tx = %tx, "[MemoryNetwork] Approval mined");
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::devnet_contracts;
    use hotvault_core::traits::TransactionWatcher;
    use hotvault_core::types::units::GIB;

    #[tokio::test]
    async fn test_needed_rate_from_price_table() {
        let network = MemoryNetwork::new();
        let rate = network
            .rate_allowance_needed(10 * GIB, false)
            .await
            .expect("rate");
        assert_eq!(rate, TokenAmount::from_base_units(226_056_134_259));
    }

    #[tokio::test]
    async fn test_deposit_moves_wallet_into_escrow() {
        let network = MemoryNetwork::new();
        let token = devnet_contracts().token;
        network.fund_wallet(TokenAmount::from_tokens(5));

        let tx = network
            .deposit(&token, TokenAmount::from_tokens(2))
            .await
            .expect("deposit");

        assert!(network.wait_for_transaction(&tx).await.expect("receipt").is_success());
        assert_eq!(network.wallet(), TokenAmount::from_tokens(3));
        assert_eq!(network.escrow().funds, TokenAmount::from_tokens(2));
    }

    #[tokio::test]
    async fn test_overdraft_reverts() {
        let network = MemoryNetwork::new();
        let token = devnet_contracts().token;
        let tx = network
            .deposit(&token, TokenAmount::from_tokens(1))
            .await
            .expect("deposit");
        assert!(!network.wait_for_transaction(&tx).await.expect("receipt").is_success());
        assert!(network.escrow().funds.is_zero());
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let network = MemoryNetwork::new();
        network.fail_reads(true);
        let client = network.client();
        assert!(network.service_approval(&client, &client).await.is_err());
    }
}
