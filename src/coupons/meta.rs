//! Coupon metadata
//!
//! Decodes the generic `(key, value)` metadata list attached to a coupon into typed fields.
//! Unknown keys are ignored and malformed values leave their field unset; an unset field
//! always means "no restriction".

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::debug;

use crate::coupons::MetaEntry;

/// Percentage off the included products, layered outside the native discount types.
pub const PERCENT_PER_PRODUCT_KEY: &str = "discount_percent_per_product";

/// Emails allowed to redeem the coupon (array or comma-separated string).
pub const ALLOWED_EMAILS_KEY: &str = "allowed_emails";

/// Expiry time of day (`HH:MM`).
pub const EXPIRY_TIME_KEY: &str = "expiry_time";

/// IANA time zone the expiry date is observed in.
pub const EXPIRY_TIMEZONE_KEY: &str = "expiry_timezone";

type MetaSetter = fn(&mut CouponMeta, &Value);

const META_FIELDS: [(&str, MetaSetter); 4] = [
    (PERCENT_PER_PRODUCT_KEY, set_percent_per_product),
    (ALLOWED_EMAILS_KEY, set_allowed_emails),
    (EXPIRY_TIME_KEY, set_expiry_time),
    (EXPIRY_TIMEZONE_KEY, set_expiry_timezone),
];

/// Typed view over a coupon's metadata. Never persisted; parsed fresh on every use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouponMeta {
    /// Percentage points off each included product line
    pub percent_per_product: Option<Decimal>,

    /// Lowercased emails allowed to redeem the coupon
    pub allowed_emails: Option<FxHashSet<String>>,

    /// Expiry time of day, as sent
    pub expiry_time: Option<String>,

    /// IANA zone name, with any `[UTC-05:00]` style prefix removed
    pub expiry_timezone: Option<String>,
}

impl CouponMeta {
    /// Parse metadata entries in a single pass. Later entries for the same key win.
    pub fn parse(entries: &[MetaEntry]) -> Self {
        let mut meta = Self::default();

        for entry in entries {
            let key = entry.key.trim();

            if let Some((_, setter)) = META_FIELDS.iter().find(|(known, _)| *known == key) {
                setter(&mut meta, &entry.value);
            }
        }

        meta
    }

    /// Returns whether `email` is allowed by the allowlist. No allowlist allows everyone.
    pub fn allows_email(&self, email: &str) -> bool {
        self.allowed_emails
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&email.trim().to_lowercase()))
    }

    /// Returns whether this is a "free item" coupon (100% off the included products).
    pub fn is_giveaway(&self) -> bool {
        self.percent_per_product == Some(Decimal::ONE_HUNDRED)
    }
}

fn set_percent_per_product(meta: &mut CouponMeta, value: &Value) {
    let parsed = match value {
        Value::Number(number) => number.to_string().parse::<Decimal>().ok(),
        Value::String(text) => text.trim().parse::<Decimal>().ok(),
        _ => None,
    };

    match parsed {
        Some(percent) => meta.percent_per_product = Some(percent.normalize()),
        None => debug!(key = PERCENT_PER_PRODUCT_KEY, %value, "ignoring malformed coupon metadata"),
    }
}

fn set_allowed_emails(meta: &mut CouponMeta, value: &Value) {
    let emails: FxHashSet<String> = match value {
        Value::Array(values) => values
            .iter()
            .filter_map(Value::as_str)
            .filter_map(normalise_email)
            .collect(),
        Value::String(text) => text.split(',').filter_map(normalise_email).collect(),
        _ => {
            debug!(key = ALLOWED_EMAILS_KEY, %value, "ignoring malformed coupon metadata");

            return;
        }
    };

    meta.allowed_emails = (!emails.is_empty()).then_some(emails);
}

fn set_expiry_time(meta: &mut CouponMeta, value: &Value) {
    meta.expiry_time = non_empty_str(value).map(str::to_string);
}

fn set_expiry_timezone(meta: &mut CouponMeta, value: &Value) {
    meta.expiry_timezone = non_empty_str(value)
        .map(strip_offset_prefix)
        .filter(|zone| !zone.is_empty())
        .map(str::to_string);
}

fn normalise_email(email: &str) -> Option<String> {
    let email = email.trim();

    (!email.is_empty()).then(|| email.to_lowercase())
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|text| !text.is_empty())
}

/// `[UTC-05:00] America/New_York` becomes `America/New_York`.
fn strip_offset_prefix(zone: &str) -> &str {
    if !zone.starts_with('[') {
        return zone;
    }

    zone.split_once(']').map_or(zone, |(_, rest)| rest.trim())
}
