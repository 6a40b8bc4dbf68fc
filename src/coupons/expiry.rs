//! Coupon expiry
//!
//! A coupon stays valid through the whole of its expiry date as observed in its own time zone,
//! and becomes expired once that zone's calendar date moves past it. Comparison is by whole
//! date only; the optional time-of-day metadata does not narrow it.
//!
//! Without a time zone, or if the zone or date cannot be parsed, the check falls back to
//! comparing "now" with the start of the expiry date in the caller's local zone.

use jiff::{Zoned, civil::Date, tz::TimeZone};
use tracing::debug;

use crate::coupons::{Coupon, CouponMeta};

/// Returns whether the coupon should be treated as expired at `now`.
///
/// `now` carries the server-local time zone used by the date-only fallback.
pub fn is_expired(coupon: &Coupon, meta: &CouponMeta, now: &Zoned) -> bool {
    let Some(expires_on) = coupon
        .expires_on
        .as_deref()
        .map(str::trim)
        .filter(|date| !date.is_empty())
    else {
        return false;
    };

    let Some(zone) = meta.expiry_timezone.as_deref() else {
        return expired_by_local_date(expires_on, now);
    };

    match expired_in_zone(expires_on, zone, now) {
        Ok(expired) => expired,
        Err(err) => {
            debug!(
                coupon = %coupon.code,
                zone,
                expires_on,
                error = %err,
                "falling back to date-only expiry check"
            );

            expired_by_local_date(expires_on, now)
        }
    }
}

/// Today's date in the coupon's zone is past the expiry date.
fn expired_in_zone(expires_on: &str, zone: &str, now: &Zoned) -> Result<bool, jiff::Error> {
    let zone = TimeZone::get(zone)?;
    let expiry = expiry_date(expires_on)?;
    let today = now.with_time_zone(zone).date();

    Ok(today > expiry)
}

/// `now` is past the start of the expiry date in the local zone. An unreadable date never
/// expires the coupon.
fn expired_by_local_date(expires_on: &str, now: &Zoned) -> bool {
    let start_of_expiry = expiry_date(expires_on)
        .and_then(|date| date.to_zoned(now.time_zone().clone()));

    match start_of_expiry {
        Ok(start) => now.timestamp() > start.timestamp(),
        Err(err) => {
            debug!(expires_on, error = %err, "unreadable coupon expiry date; treating as valid");

            false
        }
    }
}

/// Accepts `2025-03-01` as well as `WooCommerce` timestamps like `2025-03-01T00:00:00`.
fn expiry_date(expires_on: &str) -> Result<Date, jiff::Error> {
    let date = expires_on
        .split_once('T')
        .map_or(expires_on, |(date, _)| date);

    date.parse::<Date>()
}
