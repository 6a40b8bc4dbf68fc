//! `WooCommerce` coupons

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    cart::{CategoryId, ProductId},
    coupons::{Coupon, DiscountType, MetaEntry},
    money::{PricingError, parse_amount},
    woocommerce::WooCommerceError,
};

/// A coupon as returned by `GET /wp-json/wc/v3/coupons`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WooCoupon {
    /// Coupon id
    pub id: u64,

    /// Coupon code
    pub code: String,

    /// Discount value as a decimal string
    pub amount: String,

    /// `fixed_cart`, `percent` or `fixed_product`
    pub discount_type: String,

    /// Description
    pub description: String,

    /// Expiry timestamp in the store's zone, e.g. `2025-03-01T00:00:00`
    pub date_expires: Option<String>,

    /// Times redeemed
    pub usage_count: u32,

    /// Restricted product ids
    pub product_ids: Vec<ProductId>,

    /// Excluded product ids
    pub excluded_product_ids: Vec<ProductId>,

    /// Overall redemption limit
    pub usage_limit: Option<u32>,

    /// Per-customer redemption limit
    pub usage_limit_per_user: Option<u32>,

    /// Grants free shipping
    pub free_shipping: bool,

    /// Restricted category ids
    pub product_categories: Vec<CategoryId>,

    /// Excluded category ids
    pub excluded_product_categories: Vec<CategoryId>,

    /// Minimum spend as a decimal string
    pub minimum_amount: String,

    /// Maximum spend as a decimal string
    pub maximum_amount: String,

    /// Redeeming emails or customer ids
    pub used_by: Vec<Value>,

    /// Coupon metadata
    pub meta_data: Vec<WooMeta>,
}

/// A `WooCommerce` metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WooMeta {
    /// Metadata row id
    #[serde(default)]
    pub id: Option<u64>,

    /// Key
    pub key: String,

    /// Value, in whatever shape the plugin stored it
    #[serde(default)]
    pub value: Value,
}

impl TryFrom<WooCoupon> for Coupon {
    type Error = WooCommerceError;

    fn try_from(woo: WooCoupon) -> Result<Self, Self::Error> {
        let discount_type = match woo.discount_type.trim() {
            "fixed_cart" => DiscountType::FixedCart,
            "percent" => DiscountType::Percent,
            "fixed_product" => DiscountType::FixedProduct,
            other => return Err(WooCommerceError::UnknownDiscountType(other.to_string())),
        };

        let amount = parse_decimal(&woo.amount)?;

        let used_by = woo
            .used_by
            .iter()
            .filter_map(|redeemer| match redeemer {
                Value::String(text) => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .collect();

        let meta_data = woo
            .meta_data
            .into_iter()
            .map(|meta| MetaEntry::new(meta.key, meta.value))
            .collect();

        Ok(Coupon {
            id: woo.id,
            code: woo.code,
            description: woo.description,
            discount_type,
            amount,
            free_shipping: woo.free_shipping,
            minimum_amount: parse_amount(&woo.minimum_amount)?,
            maximum_amount: parse_amount(&woo.maximum_amount)?,
            product_ids: woo.product_ids,
            excluded_product_ids: woo.excluded_product_ids,
            product_categories: woo.product_categories,
            excluded_product_categories: woo.excluded_product_categories,
            usage_count: woo.usage_count,
            usage_limit: woo.usage_limit.filter(|limit| *limit > 0),
            usage_limit_per_user: woo.usage_limit_per_user.filter(|limit| *limit > 0),
            used_by,
            expires_on: woo.date_expires.map(|date| {
                date.split_once('T')
                    .map_or(date.as_str(), |(day, _)| day)
                    .to_string()
            }),
            meta_data,
        })
    }
}

/// Parse a coupon lookup response (a JSON array of coupons).
///
/// # Errors
///
/// Returns a [`WooCommerceError`] if the body is not a coupon array or a coupon cannot be
/// converted.
pub fn coupons_from_json(json: &str) -> Result<Vec<Coupon>, WooCommerceError> {
    let coupons: Vec<WooCoupon> = serde_json::from_str(json)?;

    coupons.into_iter().map(Coupon::try_from).collect()
}

fn parse_decimal(value: &str) -> Result<Decimal, PricingError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    trimmed
        .parse::<Decimal>()
        .map_err(|_err| PricingError::InvalidAmount(value.to_string()))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const LOOKUP: &str = r#"[
        {
            "id": 4471,
            "code": "dock90",
            "amount": "0.00",
            "discount_type": "fixed_cart",
            "description": "90% off a pole bumper",
            "date_expires": "2025-03-01T00:00:00",
            "usage_count": 3,
            "product_ids": [101],
            "usage_limit": 0,
            "usage_limit_per_user": 1,
            "free_shipping": true,
            "minimum_amount": "50.00",
            "maximum_amount": "",
            "used_by": ["skipper@example.com", 12],
            "meta_data": [
                {"id": 1, "key": "discount_percent_per_product", "value": "90"},
                {"id": 2, "key": "expiry_timezone", "value": "[UTC-05:00] America/New_York"}
            ]
        }
    ]"#;

    #[test]
    fn converts_lookup_response() -> TestResult {
        let coupons = coupons_from_json(LOOKUP)?;
        let coupon = coupons.first().ok_or("no coupon")?;

        assert_eq!(coupon.code, "dock90");
        assert_eq!(coupon.discount_type, DiscountType::FixedCart);
        assert_eq!(coupon.expires_on.as_deref(), Some("2025-03-01"));
        assert_eq!(coupon.minimum_amount, 5_000);
        assert_eq!(coupon.maximum_amount, 0);
        assert_eq!(coupon.usage_limit, None);
        assert_eq!(coupon.usage_limit_per_user, Some(1));
        assert_eq!(coupon.used_by, vec!["skipper@example.com", "12"]);
        assert!(coupon.free_shipping);

        let meta = coupon.meta();

        assert_eq!(meta.percent_per_product, Some(Decimal::new(90, 0)));
        assert_eq!(meta.expiry_timezone.as_deref(), Some("America/New_York"));

        Ok(())
    }

    #[test]
    fn percent_amount_is_in_points() -> TestResult {
        let woo = WooCoupon {
            code: "TEN".to_string(),
            amount: "10.00".to_string(),
            discount_type: "percent".to_string(),
            ..WooCoupon::default()
        };

        let coupon = Coupon::try_from(woo)?;

        assert_eq!(coupon.amount, Decimal::new(1000, 2));
        assert_eq!(coupon.expires_on, None);

        Ok(())
    }

    #[test]
    fn rejects_unknown_discount_type() {
        let woo = WooCoupon {
            discount_type: "recurring_percent".to_string(),
            ..WooCoupon::default()
        };

        assert!(matches!(
            Coupon::try_from(woo),
            Err(WooCommerceError::UnknownDiscountType(kind)) if kind == "recurring_percent"
        ));
    }

    #[test]
    fn rejects_malformed_amount() {
        let woo = WooCoupon {
            amount: "ten".to_string(),
            discount_type: "fixed_cart".to_string(),
            ..WooCoupon::default()
        };

        assert!(matches!(
            Coupon::try_from(woo),
            Err(WooCommerceError::Amount(PricingError::InvalidAmount(_)))
        ));
    }
}
