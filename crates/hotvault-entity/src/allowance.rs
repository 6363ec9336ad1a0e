//! Point-in-time views of a client's on-chain payment state.

use serde::{Deserialize, Serialize};

use hotvault_core::traits::payment::{EscrowAccount, ServiceApproval};
use hotvault_core::types::TokenAmount;

/// A client's allowance and usage towards the storage service.
///
/// `rate_used <= rate_allowance_current` is what a top-up aims for; it may
/// not hold before one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceSnapshot {
    /// Approved rate allowance per epoch.
    pub rate_allowance_current: TokenAmount,
    /// Rate committed to active rails.
    pub rate_used: TokenAmount,
    /// Approved lockup allowance.
    pub lockup_allowance_current: TokenAmount,
    /// Lockup held by active rails.
    pub lockup_used: TokenAmount,
    /// Capacity-scaled rate the storage service reports as needed.
    pub rate_allowance_needed: TokenAmount,
}

impl AllowanceSnapshot {
    /// Build a snapshot from an approval read and the service's needed rate.
    pub fn from_approval(approval: &ServiceApproval, rate_allowance_needed: TokenAmount) -> Self {
        Self {
            rate_allowance_current: approval.rate_allowance,
            rate_used: approval.rate_used,
            lockup_allowance_current: approval.lockup_allowance,
            lockup_used: approval.lockup_used,
            rate_allowance_needed,
        }
    }

    /// Lockup allowance not yet held by rails, clamped at zero.
    pub fn lockup_remaining(&self) -> TokenAmount {
        self.lockup_allowance_current.saturating_sub(self.lockup_used)
    }
}

/// Everything the balance fetcher reads for one client in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Network the figures were read from.
    pub network: String,
    /// Allowance and usage towards the storage service.
    pub snapshot: AllowanceSnapshot,
    /// Whether the storage service is approved at all.
    pub service_approved: bool,
    /// Token balance in the client's wallet.
    pub wallet_balance: TokenAmount,
    /// Escrow account in the payments contract.
    pub escrow: EscrowAccount,
}
