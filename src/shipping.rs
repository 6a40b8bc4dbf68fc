//! Shipping
//!
//! Shipping methods and the subtotal-tiered flat-rate table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a shipping rate table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShippingRatesError {
    /// The table has no tiers.
    #[error("shipping rate table has no tiers")]
    Empty,

    /// The first tier must cover a zero subtotal.
    #[error("first shipping tier starts at {0} cents; it must start at 0")]
    FirstTierNotZero(i64),

    /// Tier thresholds must strictly increase.
    #[error("shipping tier {0} does not start above the previous tier")]
    Unordered(usize),

    /// Shipping costs cannot be negative.
    #[error("shipping tier {0} has a negative cost")]
    NegativeCost(usize),
}

/// Shipping method, named by its `WooCommerce` method id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// Priced from the tiered flat-rate table.
    #[default]
    FlatRate,

    /// Free, usually granted by a coupon.
    FreeShipping,

    /// Collected by the customer.
    LocalPickup,
}

impl ShippingMethod {
    /// `WooCommerce` shipping method id.
    pub fn id(self) -> &'static str {
        match self {
            ShippingMethod::FlatRate => "flat_rate",
            ShippingMethod::FreeShipping => "free_shipping",
            ShippingMethod::LocalPickup => "local_pickup",
        }
    }

    /// Display title.
    pub fn title(self) -> &'static str {
        match self {
            ShippingMethod::FlatRate => "Flat rate",
            ShippingMethod::FreeShipping => "Free shipping",
            ShippingMethod::LocalPickup => "Local pickup",
        }
    }
}

/// A flat-rate tier: subtotals from `min_subtotal` up to the next tier cost `cost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingTier {
    /// Lowest subtotal in this tier, in cents
    pub min_subtotal: i64,

    /// Shipping cost in cents
    pub cost: i64,
}

impl ShippingTier {
    /// Create a new tier.
    pub const fn new(min_subtotal: i64, cost: i64) -> Self {
        Self { min_subtotal, cost }
    }
}

/// Subtotal-tiered flat-rate shipping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingRates {
    tiers: Vec<ShippingTier>,
}

impl ShippingRates {
    /// Build a table from tiers ordered by threshold.
    ///
    /// # Errors
    ///
    /// Returns a [`ShippingRatesError`] if the table is empty, does not start at zero, is not
    /// strictly increasing, or has a negative cost.
    pub fn new(tiers: impl Into<Vec<ShippingTier>>) -> Result<Self, ShippingRatesError> {
        let tiers = tiers.into();

        let first = tiers.first().ok_or(ShippingRatesError::Empty)?;

        if first.min_subtotal != 0 {
            return Err(ShippingRatesError::FirstTierNotZero(first.min_subtotal));
        }

        tiers.iter().enumerate().try_for_each(|(i, tier)| {
            if tier.cost < 0 {
                return Err(ShippingRatesError::NegativeCost(i));
            }

            let previous = i.checked_sub(1).and_then(|prev| tiers.get(prev));

            match previous {
                Some(previous) if tier.min_subtotal <= previous.min_subtotal => {
                    Err(ShippingRatesError::Unordered(i))
                }
                _ => Ok(()),
            }
        })?;

        Ok(Self { tiers })
    }

    /// Flat-rate cost for a subtotal.
    pub fn flat_rate(&self, subtotal: i64) -> i64 {
        self.tiers
            .iter()
            .rev()
            .find(|tier| subtotal >= tier.min_subtotal)
            .or_else(|| self.tiers.first())
            .map_or(0, |tier| tier.cost)
    }

    /// The tiers, lowest first.
    pub fn tiers(&self) -> &[ShippingTier] {
        &self.tiers
    }
}

impl Default for ShippingRates {
    /// Under $100: $10. $100 to under $300: $20. $300 and up: $35.
    fn default() -> Self {
        Self {
            tiers: vec![
                ShippingTier::new(0, 1_000),
                ShippingTier::new(10_000, 2_000),
                ShippingTier::new(25_000, 2_000),
                ShippingTier::new(30_000, 3_500),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn default_tier_boundaries() {
        let rates = ShippingRates::default();

        assert_eq!(rates.flat_rate(0), 1_000);
        assert_eq!(rates.flat_rate(9_999), 1_000);
        assert_eq!(rates.flat_rate(10_000), 2_000);
        assert_eq!(rates.flat_rate(24_999), 2_000);
        assert_eq!(rates.flat_rate(25_000), 2_000);
        assert_eq!(rates.flat_rate(29_999), 2_000);
        assert_eq!(rates.flat_rate(30_000), 3_500);
        assert_eq!(rates.flat_rate(1_000_000), 3_500);
    }

    #[test]
    fn default_table_is_valid() -> TestResult {
        let rebuilt = ShippingRates::new(ShippingRates::default().tiers().to_vec())?;

        assert_eq!(rebuilt, ShippingRates::default());

        Ok(())
    }

    #[test]
    fn rejects_empty_table() {
        assert_eq!(
            ShippingRates::new(Vec::new()),
            Err(ShippingRatesError::Empty)
        );
    }

    #[test]
    fn rejects_table_not_starting_at_zero() {
        assert_eq!(
            ShippingRates::new([ShippingTier::new(500, 1_000)]),
            Err(ShippingRatesError::FirstTierNotZero(500))
        );
    }

    #[test]
    fn rejects_unordered_tiers() {
        let tiers = [
            ShippingTier::new(0, 1_000),
            ShippingTier::new(10_000, 2_000),
            ShippingTier::new(10_000, 3_000),
        ];

        assert_eq!(
            ShippingRates::new(tiers),
            Err(ShippingRatesError::Unordered(2))
        );
    }

    #[test]
    fn rejects_negative_cost() {
        assert_eq!(
            ShippingRates::new([ShippingTier::new(0, -1)]),
            Err(ShippingRatesError::NegativeCost(0))
        );
    }

    #[test]
    fn method_ids_match_woocommerce() {
        assert_eq!(ShippingMethod::FlatRate.id(), "flat_rate");
        assert_eq!(ShippingMethod::FreeShipping.id(), "free_shipping");
        assert_eq!(ShippingMethod::LocalPickup.id(), "local_pickup");
    }
}
