//! `DockBloxx` Checkout
//!
//! Pricing and coupon engine for the `DockBloxx` storefront checkout. A checkout is a single
//! snapshot (cart, addresses, shipping choice, at most one coupon) that is re-priced after every
//! change: subtotal, coupon discount, tiered flat-rate shipping and the final total always agree.
//! Coupons arrive in `WooCommerce` shape and orders leave in `WooCommerce` shape.

pub mod cart;
pub mod checkout;
pub mod clock;
pub mod config;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod logging;
pub mod money;
pub mod prelude;
pub mod receipt;
pub mod service;
pub mod shipping;
pub mod storage;
pub mod woocommerce;
