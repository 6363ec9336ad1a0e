//! Payment (escrow) contract reads and writes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::{Address, TokenAmount, TxHash};

/// A client's escrow account in the payments contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Total funds deposited.
    pub funds: TokenAmount,
    /// Funds not currently locked up.
    pub available_funds: TokenAmount,
}

/// The spending approval a client has granted to a service contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceApproval {
    /// Whether the operator is approved at all.
    pub is_approved: bool,
    /// Maximum payment rate per epoch.
    pub rate_allowance: TokenAmount,
    /// Rate currently committed to active rails.
    pub rate_used: TokenAmount,
    /// Maximum total lockup.
    pub lockup_allowance: TokenAmount,
    /// Lockup currently held by active rails.
    pub lockup_used: TokenAmount,
}

/// Balance/payment service.
///
/// Writes are issued by the signer bound to the implementation and return
/// as soon as the transaction is submitted; use a
/// [`TransactionWatcher`](super::TransactionWatcher) to wait for mining.
/// All amounts are base units of the same token.
#[async_trait]
pub trait PaymentService: Send + Sync + std::fmt::Debug + 'static {
    /// Token balance held in the owner's wallet.
    async fn wallet_balance(&self, token: &Address, owner: &Address) -> AppResult<TokenAmount>;

    /// The owner's escrow account in the payments contract.
    async fn escrow_account(&self, token: &Address, owner: &Address) -> AppResult<EscrowAccount>;

    /// The approval the owner has granted to `spender`.
    async fn service_approval(
        &self,
        owner: &Address,
        spender: &Address,
    ) -> AppResult<ServiceApproval>;

    /// Rate allowance the storage service reports as needed for `capacity_bytes`.
    async fn rate_allowance_needed(&self, capacity_bytes: u64, with_cdn: bool)
    -> AppResult<TokenAmount>;

    /// Deposit `amount` into the payment escrow.
    async fn deposit(&self, token: &Address, amount: TokenAmount) -> AppResult<TxHash>;

    /// Approve `spender` up to `rate_limit` per epoch and `lockup_limit` total.
    async fn approve_service(
        &self,
        token: &Address,
        spender: &Address,
        rate_limit: TokenAmount,
        lockup_limit: TokenAmount,
    ) -> AppResult<TxHash>;
}
