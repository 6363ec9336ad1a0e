//! Storage price table.
//!
//! Prices are written as whole-token decimal strings (`"2"`, `"0.1"`) and
//! converted to base units when the table is built.

use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::TokenAmount;
use crate::types::units::TOKEN_DECIMALS;

/// Pricing configuration as written in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Price per TiB per month without CDN, in whole tokens.
    #[serde(default = "default_price_no_cdn")]
    pub price_per_tib_per_month_no_cdn: String,
    /// Price per TiB per month with CDN, in whole tokens.
    #[serde(default = "default_price_with_cdn")]
    pub price_per_tib_per_month_with_cdn: String,
    /// One-time fee charged when a new destination is created, in whole tokens.
    #[serde(default = "default_creation_fee")]
    pub destination_creation_fee: String,
}

/// Parsed price table in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Price per TiB per month without CDN.
    pub per_tib_per_month_no_cdn: TokenAmount,
    /// Price per TiB per month with CDN.
    pub per_tib_per_month_with_cdn: TokenAmount,
    /// Destination creation fee.
    pub destination_creation_fee: TokenAmount,
}

impl PriceTable {
    /// Monthly TiB price for the given CDN mode.
    pub fn per_tib_per_month(&self, with_cdn: bool) -> TokenAmount {
        if with_cdn {
            self.per_tib_per_month_with_cdn
        } else {
            self.per_tib_per_month_no_cdn
        }
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            per_tib_per_month_no_cdn: TokenAmount::from_tokens(2),
            per_tib_per_month_with_cdn: TokenAmount::from_tokens(3),
            destination_creation_fee: TokenAmount::from_u128(100_000_000_000_000_000),
        }
    }
}

impl PricingConfig {
    /// Parse the configured prices into a [`PriceTable`].
    pub fn price_table(&self) -> AppResult<PriceTable> {
        Ok(PriceTable {
            per_tib_per_month_no_cdn: TokenAmount::parse_units(
                &self.price_per_tib_per_month_no_cdn,
                TOKEN_DECIMALS,
            )?,
            per_tib_per_month_with_cdn: TokenAmount::parse_units(
                &self.price_per_tib_per_month_with_cdn,
                TOKEN_DECIMALS,
            )?,
            destination_creation_fee: TokenAmount::parse_units(
                &self.destination_creation_fee,
                TOKEN_DECIMALS,
            )?,
        })
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_per_tib_per_month_no_cdn: default_price_no_cdn(),
            price_per_tib_per_month_with_cdn: default_price_with_cdn(),
            destination_creation_fee: default_creation_fee(),
        }
    }
}

fn default_price_no_cdn() -> String {
    "2".to_string()
}

fn default_price_with_cdn() -> String {
    "3".to_string()
}

fn default_creation_fee() -> String {
    "0.1".to_string()
}
