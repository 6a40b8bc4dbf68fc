//! Coupons
//!
//! A coupon mirrors the `WooCommerce` coupon model, plus an open-ended metadata list that
//! carries store-specific extensions (see [`meta::CouponMeta`]).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cart::{CategoryId, ProductId};

pub mod expiry;
pub mod meta;
pub mod validation;

pub use expiry::is_expired;
pub use meta::CouponMeta;
pub use validation::{CouponRejection, validate_coupon};

/// Native `WooCommerce` discount types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// A flat dollar amount off the cart.
    #[default]
    FixedCart,

    /// A percentage off the cart subtotal.
    Percent,

    /// A flat dollar amount off each unit of the included products.
    FixedProduct,
}

/// A single `(key, value)` metadata entry attached to a coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    /// Metadata key
    pub key: String,

    /// Raw metadata value, in whatever shape the upstream system sent it
    #[serde(default)]
    pub value: Value,
}

impl MetaEntry {
    /// Create a new metadata entry.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A promotional code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coupon {
    /// `WooCommerce` coupon id
    pub id: u64,

    /// The code the shopper types
    pub code: String,

    /// Human description
    pub description: String,

    /// Native discount type
    pub discount_type: DiscountType,

    /// Discount value: dollars for the fixed types, percentage points for [`DiscountType::Percent`]
    pub amount: Decimal,

    /// Whether the coupon grants free shipping
    pub free_shipping: bool,

    /// Minimum subtotal in cents (zero for none)
    pub minimum_amount: i64,

    /// Maximum subtotal in cents (zero for none)
    pub maximum_amount: i64,

    /// Products the coupon is restricted to
    pub product_ids: Vec<ProductId>,

    /// Products that may not be in the cart
    pub excluded_product_ids: Vec<ProductId>,

    /// Categories the coupon is restricted to
    pub product_categories: Vec<CategoryId>,

    /// Categories that may not be in the cart
    pub excluded_product_categories: Vec<CategoryId>,

    /// Number of times the coupon has been redeemed
    pub usage_count: u32,

    /// Maximum redemptions overall
    pub usage_limit: Option<u32>,

    /// Maximum redemptions per customer email
    pub usage_limit_per_user: Option<u32>,

    /// Emails (or customer ids) that have redeemed the coupon, one entry per redemption
    pub used_by: Vec<String>,

    /// Calendar expiry date (`YYYY-MM-DD`), kept raw so malformed dates degrade gracefully
    pub expires_on: Option<String>,

    /// Open-ended metadata
    pub meta_data: Vec<MetaEntry>,
}

impl Coupon {
    /// Create a coupon with the given code, type and value and no restrictions.
    pub fn new(code: impl Into<String>, discount_type: DiscountType, amount: Decimal) -> Self {
        Self {
            code: code.into(),
            discount_type,
            amount,
            ..Self::default()
        }
    }

    /// Parse the typed view over this coupon's metadata.
    pub fn meta(&self) -> CouponMeta {
        CouponMeta::parse(&self.meta_data)
    }

    /// Returns whether a per-product discount from this coupon reaches the given product.
    ///
    /// Only products on the included list are reached, so an empty list reaches none.
    pub fn applies_to_product(&self, product: ProductId) -> bool {
        self.product_ids.contains(&product)
    }

    /// Returns whether the discount is carried by the per-product-percentage extension rather
    /// than a native `WooCommerce` discount type.
    pub fn is_per_product_percentage(&self) -> bool {
        self.meta().percent_per_product.is_some()
    }
}
