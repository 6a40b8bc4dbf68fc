//! Checkout reducers
//!
//! Each reducer takes the current snapshot and returns the next one, or an error and no
//! snapshot at all. None of them mutate their input.

use crate::{
    cart::Cart,
    checkout::{
        Address, ApplyCouponError, BillingDetails, CheckoutSnapshot, PricingContext, reconcile,
    },
    coupons::{Coupon, validate_coupon},
    money::{PricingError, checkout_total},
    shipping::ShippingMethod,
};

/// Replace the cart and reprice.
///
/// # Errors
///
/// Returns a [`PricingError`] if the new totals cannot be computed.
pub fn set_cart_items(
    state: &CheckoutSnapshot,
    cart: Cart,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, PricingError> {
    let next = CheckoutSnapshot {
        cart,
        ..state.clone()
    };

    reconcile(&next, ctx)
}

/// Replace the billing details and reprice.
///
/// # Errors
///
/// Returns a [`PricingError`] if the totals cannot be computed.
pub fn set_billing(
    state: &CheckoutSnapshot,
    billing: BillingDetails,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, PricingError> {
    let next = CheckoutSnapshot {
        billing,
        ..state.clone()
    };

    reconcile(&next, ctx)
}

/// Replace the shipping address and reprice. Shipping starts costing money once the address
/// has a street or postcode.
///
/// # Errors
///
/// Returns a [`PricingError`] if the totals cannot be computed.
pub fn set_shipping_address(
    state: &CheckoutSnapshot,
    shipping: Address,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, PricingError> {
    let next = CheckoutSnapshot {
        shipping,
        ..state.clone()
    };

    reconcile(&next, ctx)
}

/// Select a shipping method. The cost follows from the method and the subtotal.
///
/// An applied free-shipping coupon wins over a manual selection, so the state is returned
/// unchanged while one is applied.
///
/// # Errors
///
/// Returns a [`PricingError`] if the totals cannot be computed.
pub fn set_shipping_method(
    state: &CheckoutSnapshot,
    method: ShippingMethod,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, PricingError> {
    if state.coupon.as_ref().is_some_and(|coupon| coupon.free_shipping) {
        return Ok(state.clone());
    }

    let next = CheckoutSnapshot {
        shipping_method: method,
        ..state.clone()
    };

    reconcile(&next, ctx)
}

/// Select a payment method.
///
/// # Errors
///
/// Returns a [`PricingError`] if the totals cannot be computed.
pub fn set_payment_method(
    state: &CheckoutSnapshot,
    payment_method: impl Into<String>,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, PricingError> {
    let next = CheckoutSnapshot {
        payment_method: payment_method.into(),
        ..state.clone()
    };

    reconcile(&next, ctx)
}

/// Set the customer's order note.
///
/// # Errors
///
/// Returns a [`PricingError`] if the totals cannot be computed.
pub fn set_customer_note(
    state: &CheckoutSnapshot,
    note: impl Into<String>,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, PricingError> {
    let next = CheckoutSnapshot {
        customer_note: note.into(),
        ..state.clone()
    };

    reconcile(&next, ctx)
}

/// Validate `coupon` against the current checkout and, if it passes, attach it and reprice.
/// Any previously applied coupon is replaced.
///
/// # Errors
///
/// Returns [`ApplyCouponError::Rejected`] with the shopper-facing reason if validation fails,
/// or [`ApplyCouponError::Pricing`] if the totals cannot be computed.
pub fn apply_coupon(
    state: &CheckoutSnapshot,
    coupon: Coupon,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, ApplyCouponError> {
    validate_coupon(&coupon, state, ctx.now)?;

    let next = CheckoutSnapshot {
        coupon: Some(coupon),
        ..state.clone()
    };

    Ok(reconcile(&next, ctx)?)
}

/// Detach the coupon. Shipping goes back to the flat rate for the current subtotal, whatever
/// method was selected before the coupon was applied.
///
/// # Errors
///
/// Returns a [`PricingError`] if the totals cannot be computed.
pub fn remove_coupon(
    state: &CheckoutSnapshot,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, PricingError> {
    let mut next = state.clone();

    for item in next.cart.iter_mut() {
        item.set_discount(None);
    }

    let subtotal = next.cart.subtotal()?;
    let shipping_cost = ctx.rates.flat_rate(subtotal);

    next.coupon = None;
    next.subtotal = subtotal;
    next.discount_total = 0;
    next.tax_total = 0;
    next.shipping_method = ShippingMethod::FlatRate;
    next.shipping_cost = shipping_cost;
    next.total = checkout_total(subtotal, shipping_cost, 0)?;

    Ok(next)
}

/// Refresh subtotal and total from the cart, keeping the current discount and shipping
/// figures. The coupon is not re-validated or re-priced; the kept discount is only capped at
/// the new subtotal.
///
/// # Errors
///
/// Returns a [`PricingError`] if the totals cannot be computed.
pub fn calculate_totals(state: &CheckoutSnapshot) -> Result<CheckoutSnapshot, PricingError> {
    let mut next = state.clone();

    let subtotal = next.cart.subtotal()?;
    let discount_total = next.discount_total.clamp(0, subtotal.max(0));

    next.subtotal = subtotal;
    next.discount_total = discount_total;
    next.tax_total = 0;
    next.total = checkout_total(subtotal, next.shipping_cost, discount_total)?;

    Ok(next)
}
