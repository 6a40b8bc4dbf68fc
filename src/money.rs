//! Money
//!
//! Every amount inside the checkout is carried as integer minor units (cents). Decimal strings
//! from `WooCommerce` are converted on the way in, and `rusty_money` is only used to render
//! amounts for people.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::USD};
use thiserror::Error;

/// Errors raised by money arithmetic and conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The string could not be parsed as a decimal amount.
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Minor-unit arithmetic overflowed.
    #[error("amount arithmetic overflowed")]
    Overflow,
}

/// Parse a decimal money string (e.g. `"119.00"`) into cents.
///
/// Blank strings are treated as zero; `WooCommerce` sends `""` for unset spend limits.
///
/// # Errors
///
/// Returns [`PricingError::InvalidAmount`] if the string is not a decimal number and
/// [`PricingError::Overflow`] if it cannot be represented in cents.
pub fn parse_amount(value: &str) -> Result<i64, PricingError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Ok(0);
    }

    let amount = trimmed
        .parse::<Decimal>()
        .map_err(|_err| PricingError::InvalidAmount(value.to_string()))?;

    decimal_to_minor(amount)
}

/// Convert a dollar amount into cents, rounding half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the amount cannot be represented in cents.
pub fn decimal_to_minor(amount: Decimal) -> Result<i64, PricingError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or(PricingError::Overflow)
}

/// Convert cents into a two-place decimal dollar amount.
pub fn minor_to_decimal(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Render cents as a plain decimal string (`"107.10"`), the format `WooCommerce` expects.
pub fn format_decimal(minor: i64) -> String {
    minor_to_decimal(minor).to_string()
}

/// Render cents for people (`"$107.10"`).
pub fn format_money(minor: i64) -> String {
    Money::from_minor(minor, USD).to_string()
}

/// Convert percentage points (`10` for 10%) into a [`Percentage`].
pub fn percentage_points(points: Decimal) -> Percentage {
    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Calculate a percentage of an amount in minor units.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the percentage calculation overflows or
/// cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Multiply a unit amount by a quantity without overflowing.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the product does not fit in an `i64`.
pub fn times_quantity(unit: i64, quantity: u32) -> Result<i64, PricingError> {
    unit.checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)
}

/// `subtotal + shipping - discount`, the checkout total.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the arithmetic overflows.
pub fn checkout_total(subtotal: i64, shipping: i64, discount: i64) -> Result<i64, PricingError> {
    subtotal
        .checked_add(shipping)
        .and_then(|amount| amount.checked_sub(discount))
        .ok_or(PricingError::Overflow)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_amount_reads_woocommerce_strings() -> TestResult {
        assert_eq!(parse_amount("119.00")?, 11_900);
        assert_eq!(parse_amount(" 10 ")?, 1_000);
        assert_eq!(parse_amount("0.125")?, 13);
        assert_eq!(parse_amount("")?, 0);

        Ok(())
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        let result = parse_amount("ten dollars");

        assert!(matches!(
            result,
            Err(PricingError::InvalidAmount(value)) if value == "ten dollars"
        ));
    }

    #[test]
    fn format_decimal_keeps_two_places() {
        assert_eq!(format_decimal(7_000), "70.00");
        assert_eq!(format_decimal(-10_710), "-107.10");
    }

    #[test]
    fn format_money_uses_dollar_symbol() {
        assert_eq!(format_money(5_000), "$50.00");
    }

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        let percent = percentage_points(Decimal::new(90, 0));

        assert_eq!(percent_of_minor(&percent, 11_900)?, 10_710);
        assert_eq!(percent_of_minor(&percentage_points(Decimal::new(10, 0)), 5)?, 1);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(PricingError::PercentConversion)));
    }

    #[test]
    fn times_quantity_overflow_returns_error() {
        assert_eq!(times_quantity(i64::MAX, 2), Err(PricingError::Overflow));
    }

    #[test]
    fn checkout_total_adds_shipping_and_subtracts_discount() -> TestResult {
        assert_eq!(checkout_total(7_000, 1_000, 700)?, 7_300);

        Ok(())
    }
}
