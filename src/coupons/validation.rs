//! Coupon validation
//!
//! Runs the eligibility checks for a coupon against the current checkout, in a fixed order.
//! The first failing check decides the rejection.

use jiff::Zoned;
use thiserror::Error;

use crate::{
    checkout::CheckoutSnapshot,
    coupons::{Coupon, is_expired},
    money::format_money,
};

/// Why a coupon was not accepted. The `Display` text is shown to the shopper.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    /// Coupons cannot be validated for anonymous carts.
    #[error("Please enter your billing email address before applying a coupon.")]
    MissingBillingEmail,

    /// Shipping destination is needed before coupons are checked.
    #[error("Please enter your shipping postcode before applying a coupon.")]
    MissingShippingPostcode,

    /// The billing email is not on the coupon's allowlist.
    #[error("This coupon is not valid for your email address.")]
    EmailNotAllowed,

    /// A free-item coupon covers one unit in total.
    #[error(
        "This coupon covers only one free item, but your cart has {quantity} eligible items. \
         Please reduce the quantity to 1."
    )]
    GiveawayQuantityExceeded {
        /// Eligible units in the cart
        quantity: u64,
    },

    /// The coupon has expired.
    #[error("This coupon has expired.")]
    Expired,

    /// Subtotal is below the coupon's minimum spend.
    #[error("The minimum spend for this coupon is {}.", format_money(*.minimum))]
    MinimumSpendNotMet {
        /// Minimum spend in cents
        minimum: i64,
    },

    /// Subtotal is above the coupon's maximum spend.
    #[error("The maximum spend for this coupon is {}.", format_money(*.maximum))]
    MaximumSpendExceeded {
        /// Maximum spend in cents
        maximum: i64,
    },

    /// None of the cart's products are covered by the coupon.
    #[error("This coupon is not applicable to the products in your cart.")]
    NoEligibleProducts,

    /// A product the coupon excludes is in the cart.
    #[error("This coupon cannot be used with one or more products in your cart.")]
    ExcludedProductInCart,

    /// None of the cart's categories are covered by the coupon.
    #[error("This coupon is not applicable to the product categories in your cart.")]
    NoEligibleCategories,

    /// A category the coupon excludes is in the cart.
    #[error("This coupon cannot be used with one or more product categories in your cart.")]
    ExcludedCategoryInCart,

    /// The coupon has been redeemed as often as allowed.
    #[error("This coupon has reached its usage limit.")]
    UsageLimitReached,

    /// This customer has redeemed the coupon as often as allowed.
    #[error("You have already used this coupon the maximum number of times.")]
    PerUserLimitReached,
}

/// Check whether `coupon` can be applied to `snapshot` at `now`.
///
/// Pure: nothing is mutated.
///
/// # Errors
///
/// Returns the first [`CouponRejection`] in check order.
pub fn validate_coupon(
    coupon: &Coupon,
    snapshot: &CheckoutSnapshot,
    now: &Zoned,
) -> Result<(), CouponRejection> {
    let meta = coupon.meta();
    let email = snapshot.billing.email.trim();
    let cart = &snapshot.cart;

    if email.is_empty() {
        return Err(CouponRejection::MissingBillingEmail);
    }

    if snapshot.shipping.postcode.trim().is_empty() {
        return Err(CouponRejection::MissingShippingPostcode);
    }

    if !meta.allows_email(email) {
        return Err(CouponRejection::EmailNotAllowed);
    }

    if meta.is_giveaway() {
        let quantity: u64 = cart
            .iter()
            .filter(|item| coupon.applies_to_product(item.product_id()))
            .map(|item| u64::from(item.quantity()))
            .sum();

        if quantity > 1 {
            return Err(CouponRejection::GiveawayQuantityExceeded { quantity });
        }
    }

    if is_expired(coupon, &meta, now) {
        return Err(CouponRejection::Expired);
    }

    check_spend(coupon, snapshot.subtotal)?;

    if !coupon.product_ids.is_empty()
        && !cart
            .iter()
            .any(|item| coupon.product_ids.contains(&item.product_id()))
    {
        return Err(CouponRejection::NoEligibleProducts);
    }

    if cart
        .iter()
        .any(|item| coupon.excluded_product_ids.contains(&item.product_id()))
    {
        return Err(CouponRejection::ExcludedProductInCart);
    }

    if !coupon.product_categories.is_empty()
        && !cart.iter().any(|item| {
            coupon
                .product_categories
                .iter()
                .any(|category| item.in_category(*category))
        })
    {
        return Err(CouponRejection::NoEligibleCategories);
    }

    if cart.iter().any(|item| {
        coupon
            .excluded_product_categories
            .iter()
            .any(|category| item.in_category(*category))
    }) {
        return Err(CouponRejection::ExcludedCategoryInCart);
    }

    if coupon
        .usage_limit
        .is_some_and(|limit| coupon.usage_count >= limit)
    {
        return Err(CouponRejection::UsageLimitReached);
    }

    if let Some(limit) = coupon.usage_limit_per_user {
        let email = email.to_lowercase();
        let used = coupon
            .used_by
            .iter()
            .filter(|redeemer| redeemer.trim().to_lowercase() == email)
            .count();

        if used >= usize::try_from(limit).unwrap_or(usize::MAX) {
            return Err(CouponRejection::PerUserLimitReached);
        }
    }

    Ok(())
}

/// Minimum and maximum spend, each only when set above zero.
///
/// # Errors
///
/// Returns [`CouponRejection::MinimumSpendNotMet`] or
/// [`CouponRejection::MaximumSpendExceeded`].
pub fn check_spend(coupon: &Coupon, subtotal: i64) -> Result<(), CouponRejection> {
    if coupon.minimum_amount > 0 && subtotal < coupon.minimum_amount {
        return Err(CouponRejection::MinimumSpendNotMet {
            minimum: coupon.minimum_amount,
        });
    }

    if coupon.maximum_amount > 0 && subtotal > coupon.maximum_amount {
        return Err(CouponRejection::MaximumSpendExceeded {
            maximum: coupon.maximum_amount,
        });
    }

    Ok(())
}
