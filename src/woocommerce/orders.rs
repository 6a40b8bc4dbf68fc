//! `WooCommerce` orders
//!
//! Builds the `POST /wp-json/wc/v3/orders` body from a priced checkout. Native coupon types go
//! in `coupon_lines` and `WooCommerce` prices them itself. The per-product-percentage discount
//! lives in coupon metadata that `WooCommerce` does not understand, so it is sent as a negative
//! fee instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::CartItem,
    checkout::{Address, BillingDetails, CheckoutSnapshot},
    money::{PricingError, format_decimal},
};

/// Errors building an order payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderPayloadError {
    /// There is nothing to order.
    #[error("cannot place an order for an empty cart")]
    EmptyCart,

    /// The snapshot's totals disagree; it has to be reconciled before submission.
    #[error("checkout totals are inconsistent (subtotal {subtotal}, total {total})")]
    InconsistentTotals {
        /// Subtotal in cents
        subtotal: i64,

        /// Total in cents
        total: i64,
    },

    /// An amount could not be represented.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Order creation body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    /// Payment gateway id
    pub payment_method: String,

    /// Always `false`; payment is captured by the gateway
    pub set_paid: bool,

    /// Billing contact and address
    pub billing: BillingDetails,

    /// Shipping address
    pub shipping: Address,

    /// Note from the customer
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer_note: String,

    /// Products ordered
    pub line_items: Vec<LineItem>,

    /// Shipping charge
    pub shipping_lines: Vec<ShippingLine>,

    /// Native coupons for `WooCommerce` to apply
    #[serde(default)]
    pub coupon_lines: Vec<CouponLine>,

    /// Extra charges; discounts appear as negative fees
    #[serde(default)]
    pub fee_lines: Vec<FeeLine>,
}

/// An ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product id
    pub product_id: u64,

    /// Variation id for variable products
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<u64>,

    /// Units ordered
    pub quantity: u32,

    /// Selected options and custom fields
    #[serde(default)]
    pub meta_data: Vec<OrderMeta>,
}

/// A line item metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMeta {
    /// Label
    pub key: String,

    /// Value
    pub value: String,
}

/// A shipping charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLine {
    /// `flat_rate`, `free_shipping` or `local_pickup`
    pub method_id: String,

    /// Display title
    pub method_title: String,

    /// Cost as a decimal string
    pub total: String,
}

/// A native coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponLine {
    /// Coupon code
    pub code: String,
}

/// A fee (negative for discounts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    /// Label shown on the order
    pub name: String,

    /// Amount as a decimal string
    pub total: String,
}

impl TryFrom<&CheckoutSnapshot> for OrderPayload {
    type Error = OrderPayloadError;

    fn try_from(snapshot: &CheckoutSnapshot) -> Result<Self, Self::Error> {
        if snapshot.cart.is_empty() {
            return Err(OrderPayloadError::EmptyCart);
        }

        if !snapshot.is_consistent() {
            return Err(OrderPayloadError::InconsistentTotals {
                subtotal: snapshot.subtotal,
                total: snapshot.total,
            });
        }

        let mut coupon_lines = Vec::new();
        let mut fee_lines = Vec::new();

        if let Some(coupon) = &snapshot.coupon {
            if !coupon.is_per_product_percentage() {
                coupon_lines.push(CouponLine {
                    code: coupon.code.clone(),
                });
            } else if snapshot.discount_total > 0 {
                let discount = snapshot
                    .discount_total
                    .checked_neg()
                    .ok_or(PricingError::Overflow)?;

                fee_lines.push(FeeLine {
                    name: format!("Coupon: {}", coupon.code),
                    total: format_decimal(discount),
                });
            }
        }

        Ok(Self {
            payment_method: snapshot.payment_method.clone(),
            set_paid: false,
            billing: snapshot.billing.clone(),
            shipping: snapshot.shipping.clone(),
            customer_note: snapshot.customer_note.clone(),
            line_items: snapshot.cart.iter().map(LineItem::from).collect(),
            shipping_lines: vec![ShippingLine {
                method_id: snapshot.shipping_method.id().to_string(),
                method_title: snapshot.shipping_method.title().to_string(),
                total: format_decimal(snapshot.shipping_cost),
            }],
            coupon_lines,
            fee_lines,
        })
    }
}

impl From<&CartItem> for LineItem {
    fn from(item: &CartItem) -> Self {
        let variations = item.variations().iter().map(|selection| OrderMeta {
            key: selection.name.clone(),
            value: selection.value.clone(),
        });

        let custom_fields = item.custom_fields().iter().map(|field| OrderMeta {
            key: field.name.clone(),
            value: field.value.clone(),
        });

        Self {
            product_id: item.product_id(),
            variation_id: item.variation_id(),
            quantity: item.quantity(),
            meta_data: variations.chain(custom_fields).collect(),
        }
    }
}
