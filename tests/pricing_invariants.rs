//! Pricing invariants that must hold for any cart and coupon.

use jiff::Zoned;
use rust_decimal::Decimal;
use serde_json::json;
use testresult::TestResult;

use dockbloxx_checkout::{
    cart::{Cart, CartItem},
    checkout::{Address, BillingDetails, CheckoutSnapshot, PricingContext, reconcile, reducer},
    coupons::{Coupon, DiscountType, MetaEntry, meta::PERCENT_PER_PRODUCT_KEY},
    shipping::{ShippingMethod, ShippingRates},
};

fn now() -> Result<Zoned, jiff::Error> {
    "2025-03-01T12:00:00-05:00[America/New_York]".parse()
}

fn checkout(cart: Cart) -> CheckoutSnapshot {
    CheckoutSnapshot {
        billing: BillingDetails {
            email: "skipper@example.com".to_string(),
            ..BillingDetails::default()
        },
        shipping: Address {
            address_1: "1 Harbor Way".to_string(),
            postcode: "49417".to_string(),
            ..Address::default()
        },
        cart,
        ..CheckoutSnapshot::default()
    }
}

fn per_product(code: &str, product: u64, percent: &str) -> Coupon {
    Coupon {
        product_ids: vec![product],
        meta_data: vec![MetaEntry::new(PERCENT_PER_PRODUCT_KEY, json!(percent))],
        ..Coupon::new(code, DiscountType::FixedCart, Decimal::ZERO)
    }
}

fn coupons() -> Vec<Coupon> {
    vec![
        Coupon::new("FLAT25", DiscountType::FixedCart, Decimal::new(25, 0)),
        Coupon::new("FLAT500", DiscountType::FixedCart, Decimal::new(500, 0)),
        Coupon::new("PCT15", DiscountType::Percent, Decimal::new(15, 0)),
        Coupon {
            product_ids: vec![202],
            ..Coupon::new("EACH5", DiscountType::FixedProduct, Decimal::new(5, 0))
        },
        Coupon {
            product_ids: vec![101],
            ..Coupon::new("EACH200", DiscountType::FixedProduct, Decimal::new(200, 0))
        },
        per_product("DOCK90", 101, "90"),
        Coupon {
            free_shipping: true,
            ..per_product("FREEPOLE", 101, "100")
        },
    ]
}

fn carts() -> Result<Vec<Cart>, Box<dyn std::error::Error>> {
    let mut carts = Vec::new();

    for unit in [1, 999, 4_999, 9_999, 11_900, 29_999] {
        for quantity in [1, 3] {
            carts.push(Cart::with_items([
                CartItem::new(101, "Dock Pole", unit, 1)?,
                CartItem::new(202, "Dock Wheel", 2_500, quantity)?,
            ])?);
        }
    }

    Ok(carts)
}

#[test]
fn totals_always_reconcile() -> TestResult {
    let rates = ShippingRates::default();
    let now = now()?;
    let ctx = PricingContext::new(&rates, &now);

    for cart in carts()? {
        let base = reconcile(&checkout(cart), &ctx)?;

        assert!(base.is_consistent(), "uncouponed checkout is inconsistent: {base:?}");

        for coupon in coupons() {
            let code = coupon.code.clone();
            let priced = reducer::apply_coupon(&base, coupon, &ctx)?;

            assert!(priced.is_consistent(), "{code}: inconsistent totals");
            assert!(
                (0..=priced.subtotal).contains(&priced.discount_total),
                "{code}: discount {} outside [0, {}]",
                priced.discount_total,
                priced.subtotal
            );
            assert!(priced.total >= priced.shipping_cost, "{code}: total below shipping");
            assert_eq!(priced.tax_total, 0, "{code}: tax is never charged");

            let again = reconcile(&priced, &ctx)?;

            assert_eq!(again, priced, "{code}: reconcile is not idempotent");

            let removed = reducer::remove_coupon(&priced, &ctx)?;

            assert_eq!(removed.discount_total, 0, "{code}: discount survives removal");
            assert_eq!(removed.total, base.total, "{code}: removal does not restore totals");
        }
    }

    Ok(())
}

#[test]
fn flat_rate_follows_tiers() -> TestResult {
    let rates = ShippingRates::default();
    let now = now()?;
    let ctx = PricingContext::new(&rates, &now);

    for (subtotal, expected) in [
        (1, 1_000),
        (9_999, 1_000),
        (10_000, 2_000),
        (24_999, 2_000),
        (25_000, 2_000),
        (29_999, 2_000),
        (30_000, 3_500),
        (250_000, 3_500),
    ] {
        let cart = Cart::with_items([CartItem::new(101, "Dock Pole", subtotal, 1)?])?;
        let priced = reconcile(&checkout(cart), &ctx)?;

        assert_eq!(priced.shipping_method, ShippingMethod::FlatRate, "subtotal {subtotal}");
        assert_eq!(priced.shipping_cost, expected, "subtotal {subtotal}");
    }

    Ok(())
}

#[test]
fn free_shipping_coupon_pins_shipping_method() -> TestResult {
    let rates = ShippingRates::default();
    let now = now()?;
    let ctx = PricingContext::new(&rates, &now);

    let cart = Cart::with_items([CartItem::new(101, "Dock Pole", 11_900, 1)?])?;
    let base = reconcile(&checkout(cart), &ctx)?;
    let coupon = Coupon {
        free_shipping: true,
        ..Coupon::new("SHIPFREE", DiscountType::FixedCart, Decimal::ZERO)
    };

    let priced = reducer::apply_coupon(&base, coupon, &ctx)?;

    assert_eq!(priced.shipping_method, ShippingMethod::FreeShipping);
    assert_eq!(priced.total, 11_900);

    for method in [ShippingMethod::FlatRate, ShippingMethod::LocalPickup] {
        assert_eq!(
            reducer::set_shipping_method(&priced, method, &ctx)?,
            priced,
            "{method:?} replaced free shipping"
        );
    }

    Ok(())
}

#[test]
fn oversized_fixed_cart_discount_is_capped() -> TestResult {
    let rates = ShippingRates::default();
    let now = now()?;
    let ctx = PricingContext::new(&rates, &now);

    let cart = Cart::with_items([CartItem::new(101, "Pole Bumper", 7_000, 1)?])?;
    let base = reconcile(&checkout(cart), &ctx)?;

    let priced = reducer::apply_coupon(
        &base,
        Coupon::new("FLAT500", DiscountType::FixedCart, Decimal::new(500, 0)),
        &ctx,
    )?;

    assert_eq!(priced.discount_total, 7_000);
    assert_eq!(priced.total, 1_000);

    Ok(())
}

#[test]
fn stale_discount_is_capped_by_calculate_totals() -> TestResult {
    let rates = ShippingRates::default();
    let now = now()?;
    let ctx = PricingContext::new(&rates, &now);

    let cart = Cart::with_items([CartItem::new(101, "Pole Bumper", 7_000, 2)?])?;
    let priced = reducer::apply_coupon(
        &reconcile(&checkout(cart), &ctx)?,
        Coupon::new("FLAT100", DiscountType::FixedCart, Decimal::new(100, 0)),
        &ctx,
    )?;

    assert_eq!(priced.discount_total, 10_000);

    let shrunk = CheckoutSnapshot {
        cart: Cart::with_items([CartItem::new(101, "Pole Bumper", 7_000, 1)?])?,
        ..priced
    };

    let totals = reducer::calculate_totals(&shrunk)?;

    assert_eq!(totals.subtotal, 7_000);
    assert_eq!(totals.discount_total, 7_000);
    assert!(totals.is_consistent(), "capped totals are inconsistent");

    Ok(())
}

#[test]
fn giveaway_without_product_list_is_accepted_and_free() -> TestResult {
    let rates = ShippingRates::default();
    let now = now()?;
    let ctx = PricingContext::new(&rates, &now);

    let cart = Cart::with_items([
        CartItem::new(101, "Dock Pole", 7_000, 1)?,
        CartItem::new(202, "Dock Wheel", 5_000, 1)?,
    ])?;
    let base = reconcile(&checkout(cart), &ctx)?;
    let coupon = Coupon {
        meta_data: vec![MetaEntry::new(PERCENT_PER_PRODUCT_KEY, json!("100"))],
        ..Coupon::new("FREEANYTHING", DiscountType::FixedCart, Decimal::ZERO)
    };

    let priced = reducer::apply_coupon(&base, coupon, &ctx)?;

    assert_eq!(priced.discount_total, 0);
    assert_eq!(priced.total, base.total);
    assert!(priced.coupon.is_some(), "coupon is attached");

    Ok(())
}

#[test]
fn fixed_product_discount_can_exceed_the_included_line() -> TestResult {
    let rates = ShippingRates::default();
    let now = now()?;
    let ctx = PricingContext::new(&rates, &now);

    let cart = Cart::with_items([
        CartItem::new(101, "Pole Cap", 500, 1)?,
        CartItem::new(202, "Dock Wheel", 5_000, 1)?,
    ])?;
    let base = reconcile(&checkout(cart), &ctx)?;
    let coupon = Coupon {
        product_ids: vec![101],
        ..Coupon::new("CAP20", DiscountType::FixedProduct, Decimal::new(20, 0))
    };

    let priced = reducer::apply_coupon(&base, coupon, &ctx)?;

    assert_eq!(priced.subtotal, 5_500);
    assert_eq!(priced.discount_total, 2_000);
    assert!(priced.is_consistent(), "capped totals are inconsistent");

    Ok(())
}
