//! Checkout
//!
//! The checkout snapshot is the single source of truth for the checkout screen. It changes only
//! through the reducers in [`reducer`], each of which ends by running the [`reconcile`]r so
//! `total == subtotal + shipping_cost - discount_total` always holds.

use jiff::Zoned;
use serde::{Deserialize, Serialize};

use crate::{
    cart::Cart,
    coupons::Coupon,
    shipping::{ShippingMethod, ShippingRates},
};

pub mod errors;
pub mod reconcile;
pub mod reducer;
pub mod store;

pub use errors::{ApplyCouponError, CheckoutError};
pub use reconcile::reconcile;
pub use store::{CheckoutFlags, CheckoutStore, PersistedCheckout};

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Company name
    pub company: String,

    /// Street address
    pub address_1: String,

    /// Street address, second line
    pub address_2: String,

    /// City
    pub city: String,

    /// State or county code
    pub state: String,

    /// Postal code
    pub postcode: String,

    /// ISO country code
    pub country: String,
}

impl Address {
    /// Returns whether there is enough of a destination to price shipping: a street or a
    /// postal code.
    pub fn has_destination(&self) -> bool {
        !self.address_1.trim().is_empty() || !self.postcode.trim().is_empty()
    }
}

/// Billing contact and address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingDetails {
    /// Billing address
    #[serde(flatten)]
    pub address: Address,

    /// Contact email, also the identity for coupon allowlists and per-user limits
    pub email: String,

    /// Contact phone
    pub phone: String,
}

/// Everything the checkout screen shows, priced and consistent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutSnapshot {
    /// Billing contact and address
    pub billing: BillingDetails,

    /// Shipping address
    pub shipping: Address,

    /// Selected payment method id
    pub payment_method: String,

    /// Selected shipping method
    pub shipping_method: ShippingMethod,

    /// Shipping cost in cents
    pub shipping_cost: i64,

    /// Cart lines
    pub cart: Cart,

    /// The applied coupon, if any
    pub coupon: Option<Coupon>,

    /// Sum of line totals in cents
    pub subtotal: i64,

    /// Coupon discount in cents
    pub discount_total: i64,

    /// Always zero; no tax is calculated
    pub tax_total: i64,

    /// Note from the customer
    pub customer_note: String,

    /// Grand total in cents
    pub total: i64,
}

impl CheckoutSnapshot {
    /// Returns whether the totals agree with each other and with the cart.
    pub fn is_consistent(&self) -> bool {
        let subtotal_matches = self
            .cart
            .subtotal()
            .is_ok_and(|subtotal| subtotal == self.subtotal);

        let total_matches = self
            .subtotal
            .checked_add(self.shipping_cost)
            .and_then(|sum| sum.checked_sub(self.discount_total))
            .is_some_and(|total| total == self.total);

        subtotal_matches && total_matches
    }
}

/// Inputs the reconciler needs besides the snapshot itself.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'a> {
    /// Flat-rate shipping table
    pub rates: &'a ShippingRates,

    /// The current instant, in the server-local zone
    pub now: &'a Zoned,
}

impl<'a> PricingContext<'a> {
    /// Create a new pricing context.
    pub fn new(rates: &'a ShippingRates, now: &'a Zoned) -> Self {
        Self { rates, now }
    }
}
