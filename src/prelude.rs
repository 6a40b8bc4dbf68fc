//! Checkout prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartItem, Category, CustomField, VariationSelection},
    checkout::{
        Address, BillingDetails, CheckoutError, CheckoutFlags, CheckoutSnapshot, CheckoutStore,
        PricingContext, reconcile,
    },
    clock::{Clock, FixedClock, SystemClock},
    config::{CheckoutConfig, ConfigError},
    coupons::{Coupon, CouponRejection, DiscountType, MetaEntry, validate_coupon},
    discounts::{DiscountBreakdown, calculate_discount},
    money::{PricingError, format_money},
    receipt::{Receipt, ReceiptError},
    service::{CheckoutService, CheckoutServiceError, CouponLookup, InMemoryCoupons, OrderGateway},
    shipping::{ShippingMethod, ShippingRates, ShippingTier},
    storage::{JsonFileStorage, MemoryStorage, SnapshotStorage, StorageError},
    woocommerce::{OrderPayload, WooCoupon},
};
