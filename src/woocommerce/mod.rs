//! `WooCommerce`
//!
//! Wire shapes for the `WooCommerce` REST API (v3): coupons coming in, orders going out.

use thiserror::Error;

use crate::money::PricingError;

pub mod coupons;
pub mod orders;

pub use coupons::{WooCoupon, WooMeta, coupons_from_json};
pub use orders::{
    CouponLine, FeeLine, LineItem, OrderMeta, OrderPayload, OrderPayloadError, ShippingLine,
};

/// Errors converting `WooCommerce` records.
#[derive(Debug, Error)]
pub enum WooCommerceError {
    /// The coupon uses a discount type this checkout does not price.
    #[error("unknown coupon discount type: {0}")]
    UnknownDiscountType(String),

    /// A money field could not be read.
    #[error(transparent)]
    Amount(#[from] PricingError),

    /// The response body is not the expected JSON.
    #[error("invalid WooCommerce JSON: {0}")]
    Json(#[from] serde_json::Error),
}
