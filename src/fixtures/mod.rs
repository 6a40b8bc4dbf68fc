//! Fixtures
//!
//! Checkout scenarios described in YAML: who is checking out, what is in the cart, which
//! coupon they enter, and optionally the totals the scenario should end with. A scenario is
//! played through a [`CheckoutStore`] in the same order the storefront would.

use std::{fs, path::Path};

use jiff::Zoned;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::{CartError, CartItem, Category, CustomField, VariationSelection},
    checkout::{Address, BillingDetails, CheckoutError, CheckoutSnapshot, CheckoutStore},
    clock::{Clock, FixedClock, SystemClock},
    coupons::{Coupon, CouponRejection},
    money::{PricingError, parse_amount},
    shipping::{ShippingMethod, ShippingRates},
    storage::MemoryStorage,
    woocommerce::{WooCommerceError, WooCoupon},
};

const SCENARIO_DIR: &str = "./fixtures/scenarios";

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(#[from] PricingError),

    /// Invalid `now` timestamp
    #[error("Invalid scenario time: {0}")]
    InvalidTime(#[from] jiff::Error),

    /// Invalid cart line
    #[error("Invalid cart item: {0}")]
    Cart(#[from] CartError),

    /// Invalid coupon
    #[error("Invalid coupon: {0}")]
    Coupon(#[from] WooCommerceError),

    /// The checkout failed for a reason other than a coupon rejection
    #[error("Checkout failed: {0}")]
    Checkout(#[from] CheckoutError),
}

/// A checkout scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Short description
    #[serde(default)]
    pub name: String,

    /// Fixed "now", e.g. `2025-03-01T12:00:00-05:00[America/New_York]`. The system clock is
    /// used when absent.
    #[serde(default)]
    pub now: Option<String>,

    /// Billing details
    #[serde(default)]
    pub billing: BillingDetails,

    /// Shipping address
    #[serde(default)]
    pub shipping: Address,

    /// Shipping method chosen before the coupon is entered
    #[serde(default)]
    pub shipping_method: Option<ShippingMethod>,

    /// Cart lines, added in order
    pub items: Vec<ScenarioItem>,

    /// Coupon the shopper enters, in `WooCommerce` REST shape
    #[serde(default)]
    pub coupon: Option<WooCoupon>,

    /// Remove the coupon again after applying it
    #[serde(default)]
    pub remove_coupon: bool,

    /// Expected outcome
    #[serde(default)]
    pub expect: Option<ScenarioExpectation>,
}

/// A cart line in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioItem {
    /// Product id
    pub product_id: u64,

    /// Product name
    #[serde(default)]
    pub name: String,

    /// Unit price, e.g. `"119.00"`
    pub price: String,

    /// Units
    #[serde(default = "one")]
    pub quantity: u32,

    /// Variation id
    #[serde(default)]
    pub variation_id: Option<u64>,

    /// Variation selections
    #[serde(default)]
    pub variations: Vec<VariationSelection>,

    /// Custom fields
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,

    /// Categories
    #[serde(default)]
    pub categories: Vec<Category>,
}

fn one() -> u32 {
    1
}

impl TryFrom<&ScenarioItem> for CartItem {
    type Error = FixtureError;

    fn try_from(item: &ScenarioItem) -> Result<Self, Self::Error> {
        let mut line = CartItem::new(
            item.product_id,
            item.name.clone(),
            parse_amount(&item.price)?,
            item.quantity,
        )?
        .with_variations(item.variations.iter().cloned())
        .with_custom_fields(item.custom_fields.iter().cloned())
        .with_categories(item.categories.iter().cloned());

        if let Some(variation_id) = item.variation_id {
            line = line.with_variation_id(variation_id);
        }

        Ok(line)
    }
}

/// Totals a scenario should end with, as dollar strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioExpectation {
    /// Expected subtotal
    pub subtotal: Option<String>,

    /// Expected discount
    pub discount_total: Option<String>,

    /// Expected shipping cost
    pub shipping_cost: Option<String>,

    /// Expected shipping method
    pub shipping_method: Option<ShippingMethod>,

    /// Expected total
    pub total: Option<String>,

    /// Whether the coupon should be rejected
    pub rejected: bool,
}

/// Expected totals in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpectedTotals {
    /// Expected subtotal
    pub subtotal: Option<i64>,

    /// Expected discount
    pub discount_total: Option<i64>,

    /// Expected shipping cost
    pub shipping_cost: Option<i64>,

    /// Expected total
    pub total: Option<i64>,
}

impl ScenarioExpectation {
    /// Expected totals in cents.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidPrice`] if an amount is not a dollar amount.
    pub fn totals(&self) -> Result<ExpectedTotals, FixtureError> {
        let cents = |amount: Option<&str>| amount.map(parse_amount).transpose();

        Ok(ExpectedTotals {
            subtotal: cents(self.subtotal.as_deref())?,
            discount_total: cents(self.discount_total.as_deref())?,
            shipping_cost: cents(self.shipping_cost.as_deref())?,
            total: cents(self.total.as_deref())?,
        })
    }
}

/// What happened when a scenario was played.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    /// The final checkout
    pub snapshot: CheckoutSnapshot,

    /// Why the coupon was refused, if it was
    pub rejection: Option<CouponRejection>,
}

impl Scenario {
    /// Parse a scenario from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Yaml`] if the YAML does not describe a scenario.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Read a scenario file.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Load a named scenario from `./fixtures/scenarios/{name}.yml`.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the file cannot be read or parsed.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_path(Path::new(SCENARIO_DIR).join(format!("{name}.yml")))
    }

    /// The scenario's coupon in domain form.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Coupon`] if the coupon cannot be converted.
    pub fn coupon(&self) -> Result<Option<Coupon>, FixtureError> {
        Ok(self.coupon.clone().map(Coupon::try_from).transpose()?)
    }

    /// Play the scenario against a fresh in-memory checkout.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the scenario is malformed or the checkout fails for a
    /// reason other than a coupon rejection.
    pub fn run(&self, rates: &ShippingRates) -> Result<ScenarioOutcome, FixtureError> {
        let now = match &self.now {
            Some(now) => now.parse::<Zoned>()?,
            None => SystemClock.now(),
        };

        let mut store =
            CheckoutStore::new(rates.clone(), MemoryStorage::new(), FixedClock::new(now));

        store.set_billing(self.billing.clone())?;
        store.set_shipping_address(self.shipping.clone())?;

        for item in &self.items {
            store.add_item(CartItem::try_from(item)?)?;
        }

        if let Some(method) = self.shipping_method {
            store.set_shipping_method(method)?;
        }

        let mut rejection = None;

        if let Some(coupon) = self.coupon()? {
            match store.apply_coupon(coupon) {
                Ok(()) => {}
                Err(CheckoutError::Rejected(reason)) => rejection = Some(reason),
                Err(err) => return Err(err.into()),
            }
        }

        if self.remove_coupon {
            store.remove_coupon()?;
        }

        Ok(ScenarioOutcome {
            snapshot: store.snapshot().clone(),
            rejection,
        })
    }
}
