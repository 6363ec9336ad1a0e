//! Storage metrics calculator.
//!
//! The needed rate is derived from the configured price table rather than
//! from the "needed" figure reported on-chain, so the result depends only
//! on the request, the snapshot, and literal prices. The snapshot's
//! `rate_allowance_needed` is used solely for the usage estimate.

use tracing::debug;

use hotvault_core::config::PriceTable;
use hotvault_core::types::TokenAmount;
use hotvault_core::types::units::EPOCHS_PER_DAY;
use hotvault_entity::{AllowanceSnapshot, ReportParts, StorageRequest, SufficiencyReport};

use crate::allowance::math::{self, Runway};

/// Whether the upload will append to an existing destination or create one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationPlan {
    /// Append to an existing destination; no creation fee.
    Reuse,
    /// Create a new destination; the creation fee is added to the deposit.
    Create,
}

/// Composes the allowance math into a [`SufficiencyReport`].
#[derive(Debug, Clone)]
pub struct StorageMetricsCalculator {
    /// Prices in base units.
    prices: PriceTable,
    /// Epochs per day used to convert rates into daily lockup.
    epochs_per_day: u64,
}

impl StorageMetricsCalculator {
    /// Creates a calculator for the given price table.
    pub fn new(prices: PriceTable) -> Self {
        Self {
            prices,
            epochs_per_day: EPOCHS_PER_DAY,
        }
    }

    /// The price table in use.
    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Rate per epoch that `capacity_bytes` costs in the given CDN mode.
    pub fn rate_needed(&self, capacity_bytes: u64, use_cdn: bool) -> TokenAmount {
        let per_epoch = math::price_per_tib_per_epoch(self.prices.per_tib_per_month(use_cdn));
        math::rate_per_epoch(capacity_bytes, per_epoch)
    }

    /// Sufficiency of `snapshot` for `request`, appending to an existing destination.
    pub fn compute_metrics(
        &self,
        request: &StorageRequest,
        snapshot: &AllowanceSnapshot,
    ) -> SufficiencyReport {
        self.compute(request, snapshot, DestinationPlan::Reuse)
    }

    /// Sufficiency of `snapshot` for `request` under a destination plan.
    pub fn compute(
        &self,
        request: &StorageRequest,
        snapshot: &AllowanceSnapshot,
        plan: DestinationPlan,
    ) -> SufficiencyReport {
        let rate_needed = self.rate_needed(request.capacity_bytes, request.use_cdn);
        let lockup_per_day_needed = math::lockup_per_day(rate_needed, self.epochs_per_day);
        let lockup_per_day_current = math::lockup_per_day(snapshot.rate_used, self.epochs_per_day);

        let runway = Runway::new(snapshot.lockup_remaining(), lockup_per_day_current);
        let persistence_days_left = runway.days();
        let lockup_needed = math::required_lockup(
            request.persistence_days,
            &runway,
            lockup_per_day_needed,
            snapshot.lockup_used,
        );

        let creation_fee = match plan {
            DestinationPlan::Reuse => TokenAmount::zero(),
            DestinationPlan::Create => self.prices.destination_creation_fee,
        };

        let is_rate_sufficient =
            math::is_rate_sufficient(snapshot.rate_allowance_current, rate_needed);
        let is_lockup_sufficient =
            math::is_lockup_sufficient(persistence_days_left, request.min_days_threshold);

        debug!(
            capacity_bytes = request.capacity_bytes,
            use_cdn = request.use_cdn,
            rate_needed = %rate_needed,
            lockup_needed = %lockup_needed,
            persistence_days_left,
            is_rate_sufficient,
            is_lockup_sufficient,
            "Computed storage metrics"
        );

        SufficiencyReport::new(ReportParts {
            rate_needed,
            lockup_per_day: lockup_per_day_needed,
            lockup_needed,
            creation_fee,
            persistence_days_left,
            current_usage_bytes: math::current_storage_usage_bytes(
                snapshot.rate_used,
                snapshot.rate_allowance_needed,
                request.capacity_bytes,
            ),
            rate_allowance_current: snapshot.rate_allowance_current,
            lockup_allowance_current: snapshot.lockup_allowance_current,
            is_rate_sufficient,
            is_lockup_sufficient,
        })
    }
}

impl Default for StorageMetricsCalculator {
    fn default() -> Self {
        Self::new(PriceTable::default())
    }
}
