//! Shared state, fault switches, and the transaction watcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use hotvault_core::config::PriceTable;
use hotvault_core::error::AppError;
use hotvault_core::result::AppResult;
use hotvault_core::traits::{
    DestinationRecord, EscrowAccount, ServiceApproval, TransactionWatcher, TxReceipt, TxStatus,
};
use hotvault_core::types::{Address, DestinationId, ProviderId, TokenAmount, TxHash};

use super::{devnet_client, devnet_payee};

/// A collaborator call observed by the simulated network, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainCall {
    /// Wallet balance read.
    WalletBalance,
    /// Escrow account read.
    EscrowAccount,
    /// Service approval read.
    ServiceApproval,
    /// Needed-rate read.
    RateAllowanceNeeded,
    /// Deposit submitted.
    Deposit(TokenAmount),
    /// Service approval submitted.
    Approve {
        /// Approved rate per epoch.
        rate_limit: TokenAmount,
        /// Approved total lockup.
        lockup_limit: TokenAmount,
    },
    /// Receipt wait.
    Wait(TxHash),
    /// Destination listing.
    ListDestinations,
    /// Provider lookup.
    ResolveProvider(DestinationId),
    /// Destination creation submitted.
    CreateDestination {
        /// Requested CDN mode.
        with_cdn: bool,
    },
    /// Destination creation confirmation.
    ConfirmDestination(TxHash),
    /// Bytes handed to the provider.
    Upload {
        /// Target destination.
        destination: DestinationId,
        /// Payload size.
        size_bytes: u64,
    },
}

impl ChainCall {
    /// Whether the call only reads payment state.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Self::WalletBalance | Self::EscrowAccount | Self::ServiceApproval | Self::RateAllowanceNeeded
        )
    }

    /// Whether the call submits or waits on a transaction.
    pub fn is_transaction(&self) -> bool {
        matches!(
            self,
            Self::Deposit(_)
                | Self::Approve { .. }
                | Self::Wait(_)
                | Self::CreateDestination { .. }
                | Self::ConfirmDestination(_)
        )
    }
}

/// Failure switches. All off by default.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Payment reads fail as if the node were unreachable.
    pub fail_reads: bool,
    /// Deposits are mined but revert.
    pub revert_deposits: bool,
    /// Approvals are mined but revert.
    pub revert_approvals: bool,
    /// Provider lookups fail.
    pub fail_provider_lookup: bool,
    /// Destination creation is rejected.
    pub fail_destination_creation: bool,
    /// The provider rejects uploads.
    pub fail_transfer: bool,
    /// The provider does not surface the root-registration hash.
    pub omit_root_tx_hash: bool,
    /// The provider never confirms roots.
    pub withhold_root_confirmation: bool,
    /// Root registrations are mined but revert.
    pub revert_root_registration: bool,
}

#[derive(Debug)]
pub(super) struct State {
    pub(super) client: Address,
    pub(super) prices: PriceTable,
    pub(super) wallet: TokenAmount,
    pub(super) escrow: EscrowAccount,
    pub(super) approval: ServiceApproval,
    pub(super) destinations: Vec<DestinationRecord>,
    pub(super) providers: HashMap<DestinationId, ProviderId>,
    pub(super) pending_destinations: HashMap<TxHash, DestinationRecord>,
    pub(super) transactions: HashMap<TxHash, TxReceipt>,
    pub(super) next_destination: u64,
    pub(super) next_root: u64,
    pub(super) block: u64,
    pub(super) transfer_delay: Duration,
    pub(super) faults: Faults,
    pub(super) calls: Vec<ChainCall>,
}

impl State {
    /// Mine a transaction with the given status and return its hash.
    pub(super) fn mine(&mut self, status: TxStatus) -> TxHash {
        self.block += 1;
        let mut bytes = [0u8; 32];
        bytes[0] = 0x7c;
        bytes[24..].copy_from_slice(&self.block.to_be_bytes());
        let tx_hash = TxHash::from_bytes(bytes);
        self.transactions.insert(
            tx_hash.clone(),
            TxReceipt {
                tx_hash: tx_hash.clone(),
                status,
                block_number: self.block,
            },
        );
        tx_hash
    }

    pub(super) fn owns(&self, owner: &Address) -> bool {
        *owner == self.client
    }
}

/// Simulated chain, payment contracts, registry, and provider.
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
    state: Arc<Mutex<State>>,
}

impl MemoryNetwork {
    /// Creates an empty network for [`devnet_client`] with default prices.
    pub fn new() -> Self {
        Self::with_prices(PriceTable::default())
    }

    /// Creates an empty network with the given price table.
    pub fn with_prices(prices: PriceTable) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                client: devnet_client(),
                prices,
                wallet: TokenAmount::zero(),
                escrow: EscrowAccount::default(),
                approval: ServiceApproval::default(),
                destinations: Vec::new(),
                providers: HashMap::new(),
                pending_destinations: HashMap::new(),
                transactions: HashMap::new(),
                next_destination: 1,
                next_root: 1,
                block: 0,
                transfer_delay: Duration::ZERO,
                faults: Faults::default(),
                calls: Vec::new(),
            })),
        }
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(super) fn record(&self, call: ChainCall) {
        debug!(call = ?call, "[MemoryNetwork] call");
        self.lock().calls.push(call);
    }

    /// The paying client.
    pub fn client(&self) -> Address {
        self.lock().client.clone()
    }

    /// Credit the client's wallet.
    pub fn fund_wallet(&self, amount: TokenAmount) {
        let mut state = self.lock();
        state.wallet = state.wallet.saturating_add(amount);
    }

    /// Current wallet balance.
    pub fn wallet(&self) -> TokenAmount {
        self.lock().wallet
    }

    /// Current escrow account.
    pub fn escrow(&self) -> EscrowAccount {
        self.lock().escrow.clone()
    }

    /// Current service approval.
    pub fn approval(&self) -> ServiceApproval {
        self.lock().approval.clone()
    }

    /// Replace the service approval.
    pub fn set_approval(&self, approval: ServiceApproval) {
        self.lock().approval = approval;
    }

    /// Register an existing destination and return its id.
    pub fn add_destination(
        &self,
        with_cdn: bool,
        current_piece_count: u64,
        provider: Option<ProviderId>,
    ) -> DestinationId {
        let mut state = self.lock();
        let id = DestinationId(state.next_destination);
        state.next_destination += 1;
        state.destinations.push(DestinationRecord {
            id,
            payee: devnet_payee(),
            with_cdn,
            current_piece_count,
        });
        if let Some(provider) = provider {
            state.providers.insert(id, provider);
        }
        id
    }

    /// All destinations, including ones created during the test.
    pub fn destinations(&self) -> Vec<DestinationRecord> {
        self.lock().destinations.clone()
    }

    /// Replace all fault switches.
    pub fn set_faults(&self, faults: Faults) {
        self.lock().faults = faults;
    }

    /// Update the fault switches in place.
    pub fn update_faults(&self, update: impl FnOnce(&mut Faults)) {
        update(&mut self.lock().faults);
    }

    /// Make payment reads fail.
    pub fn fail_reads(&self, on: bool) {
        self.update_faults(|f| f.fail_reads = on);
    }

    /// Make deposits revert.
    pub fn revert_deposits(&self, on: bool) {
        self.update_faults(|f| f.revert_deposits = on);
    }

    /// Delay each provider transfer by `delay`.
    pub fn set_transfer_delay(&self, delay: Duration) {
        self.lock().transfer_delay = delay;
    }

    /// Calls observed so far.
    pub fn calls(&self) -> Vec<ChainCall> {
        self.lock().calls.clone()
    }

    /// Number of payment reads observed so far.
    pub fn read_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_read()).count()
    }

    pub(super) fn faults(&self) -> Faults {
        self.lock().faults.clone()
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionWatcher for MemoryNetwork {
    async fn wait_for_transaction(&self, tx: &TxHash) -> AppResult<TxReceipt> {
        self.record(ChainCall::Wait(tx.clone()));
        self.lock()
            .transactions
            .get(tx)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Transaction {tx} not found")))
    }
}
