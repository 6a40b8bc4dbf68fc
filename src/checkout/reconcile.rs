//! Totals reconciler
//!
//! Recomputes subtotal, discount, shipping and total from the cart, coupon and addresses.
//! Everything else in the snapshot passes through untouched.

use crate::{
    checkout::{CheckoutSnapshot, PricingContext},
    discounts::{DiscountBreakdown, calculate_discount},
    money::{PricingError, checkout_total},
    shipping::{ShippingMethod, ShippingRates},
};

/// Restore the totals invariant for `snapshot`.
///
/// Shipping is priced at zero until the shipping address has a street or postcode, keeping
/// whichever method was selected. With a destination, the method and cost are decided in this
/// order: a free-shipping coupon, a selected local pickup, a sticky free-shipping selection, and
/// finally the flat-rate table for the subtotal.
///
/// Reconciling a reconciled snapshot returns it unchanged.
///
/// # Errors
///
/// Returns a [`PricingError`] if any amount overflows. Nothing is returned in that case, so the
/// caller keeps its previous snapshot.
pub fn reconcile(
    snapshot: &CheckoutSnapshot,
    ctx: &PricingContext<'_>,
) -> Result<CheckoutSnapshot, PricingError> {
    let mut next = snapshot.clone();

    let subtotal = next.cart.subtotal()?;

    let discount = match &next.coupon {
        Some(coupon) => calculate_discount(coupon, &next.cart, subtotal, ctx.now)?,
        None => DiscountBreakdown {
            total: 0,
            lines: vec![None; next.cart.len()],
        },
    };

    for (item, line) in next.cart.iter_mut().zip(discount.lines) {
        item.set_discount(line);
    }

    next.subtotal = subtotal;
    next.discount_total = discount.total;
    next.tax_total = 0;

    let (method, cost) = if next.shipping.has_destination() {
        shipping_for(&next, ctx.rates, subtotal)
    } else {
        (next.shipping_method, 0)
    };

    next.shipping_method = method;
    next.shipping_cost = cost;
    next.total = checkout_total(subtotal, cost, discount.total)?;

    Ok(next)
}

fn shipping_for(
    snapshot: &CheckoutSnapshot,
    rates: &ShippingRates,
    subtotal: i64,
) -> (ShippingMethod, i64) {
    if snapshot.coupon.as_ref().is_some_and(|coupon| coupon.free_shipping) {
        return (ShippingMethod::FreeShipping, 0);
    }

    match snapshot.shipping_method {
        ShippingMethod::LocalPickup => (ShippingMethod::LocalPickup, 0),
        ShippingMethod::FreeShipping => (ShippingMethod::FreeShipping, 0),
        ShippingMethod::FlatRate => (ShippingMethod::FlatRate, rates.flat_rate(subtotal)),
    }
}
