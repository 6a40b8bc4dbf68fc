//! Discounts
//!
//! Dollar discount for an already-validated coupon against a cart. Also used as a cheap
//! recompute path that skips the full validator, so expiry and spend limits are re-checked
//! here and zero out the discount when they fail.

use jiff::Zoned;

use crate::{
    cart::{Cart, CartItem},
    coupons::{Coupon, DiscountType, is_expired, validation::check_spend},
    money::{PricingError, decimal_to_minor, percent_of_minor, percentage_points, times_quantity},
};

/// The discount a coupon grants, with the per-line allocation for per-product coupons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountBreakdown {
    /// Discount in cents, within `[0, subtotal]`
    pub total: i64,

    /// Per-line allocation, parallel to the cart lines. `None` for cart-level discounts.
    pub lines: Vec<Option<i64>>,
}

impl DiscountBreakdown {
    fn none(cart: &Cart) -> Self {
        Self {
            total: 0,
            lines: vec![None; cart.len()],
        }
    }
}

/// Calculate the discount for `coupon` against `cart`.
///
/// The per-product-percentage extension (coupon metadata) takes precedence over the native
/// discount type: it is a percentage off each included line. The native types are
/// - fixed cart: the coupon amount in dollars,
/// - percent: the coupon amount in percentage points of the subtotal,
/// - fixed product: the coupon amount off each included unit.
///
/// # Errors
///
/// Returns a [`PricingError`] if the discount cannot be represented in cents.
pub fn calculate_discount(
    coupon: &Coupon,
    cart: &Cart,
    subtotal: i64,
    now: &Zoned,
) -> Result<DiscountBreakdown, PricingError> {
    let meta = coupon.meta();

    if is_expired(coupon, &meta, now) || check_spend(coupon, subtotal).is_err() {
        return Ok(DiscountBreakdown::none(cart));
    }

    let breakdown = if let Some(points) = meta.percent_per_product {
        let percent = percentage_points(points);

        per_line(coupon, cart, |item| {
            let price = item.price()?;

            Ok(percent_of_minor(&percent, price)?.min(price))
        })?
    } else {
        match coupon.discount_type {
            DiscountType::FixedCart => cart_level(cart, decimal_to_minor(coupon.amount)?),
            DiscountType::Percent => {
                let percent = percentage_points(coupon.amount);

                cart_level(cart, percent_of_minor(&percent, subtotal)?)
            }
            DiscountType::FixedProduct => {
                let unit = decimal_to_minor(coupon.amount)?;

                per_line(coupon, cart, |item| times_quantity(unit, item.quantity()))?
            }
        }
    };

    Ok(DiscountBreakdown {
        total: breakdown.total.clamp(0, subtotal.max(0)),
        lines: breakdown.lines,
    })
}

fn cart_level(cart: &Cart, amount: i64) -> DiscountBreakdown {
    DiscountBreakdown {
        total: amount,
        lines: vec![None; cart.len()],
    }
}

/// Discount each line the coupon reaches. A line's allocation is never negative.
fn per_line<F>(
    coupon: &Coupon,
    cart: &Cart,
    line_discount: F,
) -> Result<DiscountBreakdown, PricingError>
where
    F: Fn(&CartItem) -> Result<i64, PricingError>,
{
    let mut lines = Vec::with_capacity(cart.len());
    let mut total = 0_i64;

    for item in cart {
        if !coupon.applies_to_product(item.product_id()) {
            lines.push(None);
            continue;
        }

        let amount = line_discount(item)?.max(0);

        total = total.checked_add(amount).ok_or(PricingError::Overflow)?;
        lines.push(Some(amount));
    }

    Ok(DiscountBreakdown { total, lines })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use testresult::TestResult;

    use crate::coupons::{MetaEntry, meta::PERCENT_PER_PRODUCT_KEY};

    use super::*;

    fn now() -> Result<Zoned, jiff::Error> {
        "2025-03-01T12:00:00-05:00[America/New_York]".parse()
    }

    fn cart() -> Result<Cart, Box<dyn std::error::Error>> {
        Ok(Cart::with_items([
            CartItem::new(101, "Pole Bumper", 11_900, 1)?,
            CartItem::new(202, "Dock Wheel", 5_000, 2)?,
        ])?)
    }

    #[test]
    fn fixed_cart_is_flat_amount() -> TestResult {
        let cart = cart()?;
        let coupon = Coupon::new("FIVE", DiscountType::FixedCart, Decimal::new(5, 0));

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 500);
        assert_eq!(discount.lines, vec![None, None]);

        Ok(())
    }

    #[test]
    fn percent_is_share_of_subtotal() -> TestResult {
        let cart = Cart::with_items([CartItem::new(101, "Pole Bumper", 7_000, 1)?])?;
        let coupon = Coupon::new("TEN", DiscountType::Percent, Decimal::TEN);

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 700);

        Ok(())
    }

    #[test]
    fn fixed_product_is_per_unit_on_included_products() -> TestResult {
        let cart = cart()?;
        let coupon = Coupon {
            product_ids: vec![202],
            ..Coupon::new("WHEELS", DiscountType::FixedProduct, Decimal::new(750, 2))
        };

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 1_500);
        assert_eq!(discount.lines, vec![None, Some(1_500)]);

        Ok(())
    }

    #[test]
    fn fixed_product_is_capped_by_subtotal_not_line_price() -> TestResult {
        let cart = Cart::with_items([
            CartItem::new(101, "Pole Cap", 500, 1)?,
            CartItem::new(202, "Dock Wheel", 5_000, 1)?,
        ])?;
        let coupon = Coupon {
            product_ids: vec![101],
            ..Coupon::new("BIG", DiscountType::FixedProduct, Decimal::new(20, 0))
        };

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 2_000);
        assert_eq!(discount.lines, vec![Some(2_000), None]);

        let small = Cart::with_items([CartItem::new(101, "Pole Cap", 500, 2)?])?;
        let discount = calculate_discount(&coupon, &small, small.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 1_000);

        Ok(())
    }

    #[test]
    fn fixed_product_without_product_list_discounts_nothing() -> TestResult {
        let cart = Cart::with_items([CartItem::new(202, "Dock Wheel", 5_000, 2)?])?;
        let coupon = Coupon::new("EACH5", DiscountType::FixedProduct, Decimal::new(5, 0));

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 0);
        assert_eq!(discount.lines, vec![None]);

        Ok(())
    }

    #[test]
    fn per_product_percentage_without_product_list_discounts_nothing() -> TestResult {
        let cart = cart()?;
        let coupon = Coupon {
            meta_data: vec![MetaEntry::new(PERCENT_PER_PRODUCT_KEY, json!("90"))],
            ..Coupon::new("NINETY", DiscountType::FixedCart, Decimal::ZERO)
        };

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 0);
        assert_eq!(discount.lines, vec![None, None]);

        Ok(())
    }

    #[test]
    fn per_product_percentage_never_exceeds_line_price() -> TestResult {
        let cart = cart()?;
        let coupon = Coupon {
            product_ids: vec![101],
            meta_data: vec![MetaEntry::new(PERCENT_PER_PRODUCT_KEY, json!("150"))],
            ..Coupon::new("TOOMUCH", DiscountType::FixedCart, Decimal::ZERO)
        };

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 11_900);
        assert_eq!(discount.lines, vec![Some(11_900), None]);

        Ok(())
    }

    #[test]
    fn per_product_percentage_discounts_only_included_lines() -> TestResult {
        let cart = Cart::with_items([
            CartItem::new(101, "Pole Bumper", 11_900, 1)?,
            CartItem::new(202, "Dock Wheel", 5_000, 1)?,
        ])?;
        let coupon = Coupon {
            product_ids: vec![101],
            meta_data: vec![MetaEntry::new(PERCENT_PER_PRODUCT_KEY, json!("90"))],
            ..Coupon::new("NINETY", DiscountType::Percent, Decimal::new(5, 0))
        };

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 10_710);
        assert_eq!(discount.lines, vec![Some(10_710), None]);

        Ok(())
    }

    #[test]
    fn clamped_to_subtotal() -> TestResult {
        let cart = Cart::with_items([CartItem::new(101, "Pole Bumper", 1_000, 1)?])?;
        let coupon = Coupon::new("HUGE", DiscountType::FixedCart, Decimal::new(50, 0));

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 1_000);

        Ok(())
    }

    #[test]
    fn negative_amount_clamps_to_zero() -> TestResult {
        let cart = cart()?;
        let coupon = Coupon::new("ODD", DiscountType::FixedCart, Decimal::new(-5, 0));

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 0);

        Ok(())
    }

    #[test]
    fn expired_coupon_grants_nothing() -> TestResult {
        let cart = cart()?;
        let coupon = Coupon {
            expires_on: Some("2020-01-01".to_string()),
            ..Coupon::new("OLD", DiscountType::FixedCart, Decimal::new(5, 0))
        };

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount, DiscountBreakdown::none(&cart));

        Ok(())
    }

    #[test]
    fn unmet_minimum_spend_grants_nothing() -> TestResult {
        let cart = cart()?;
        let coupon = Coupon {
            minimum_amount: 100_000,
            ..Coupon::new("BIGSPENDER", DiscountType::Percent, Decimal::TEN)
        };

        let discount = calculate_discount(&coupon, &cart, cart.subtotal()?, &now()?)?;

        assert_eq!(discount.total, 0);

        Ok(())
    }
}
