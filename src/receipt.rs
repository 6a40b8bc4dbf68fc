//! Receipt

use std::{fmt::Write, io};

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::CartItem,
    checkout::CheckoutSnapshot,
    money::{PricingError, format_money},
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// A line price could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable summary of a priced checkout.
#[derive(Debug, Clone, Copy)]
pub struct Receipt<'a> {
    snapshot: &'a CheckoutSnapshot,
}

impl<'a> Receipt<'a> {
    /// Create a receipt for a reconciled checkout.
    pub fn new(snapshot: &'a CheckoutSnapshot) -> Self {
        Self { snapshot }
    }

    /// The checkout being rendered.
    pub fn snapshot(&self) -> &'a CheckoutSnapshot {
        self.snapshot
    }

    /// Write the cart table and totals.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if a line price overflows or the writer fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Options", "Qty", "Unit Price", "Price", "Discount"]);

        for (idx, item) in self.snapshot.cart.iter().enumerate() {
            builder.push_record(item_row(idx, item)?);
        }

        write_receipt_table(&mut out, builder)?;
        write_receipt_summary(&mut out, self.snapshot)
    }
}

fn item_row(idx: usize, item: &CartItem) -> Result<[String; 7], ReceiptError> {
    let options = item
        .variations()
        .iter()
        .map(|selection| format!("{}: {}", selection.name, selection.value))
        .chain(
            item.custom_fields()
                .iter()
                .map(|field| format!("{}: {}", field.name, field.value)),
        )
        .collect::<Vec<_>>()
        .join("\n");

    let discount = item
        .discount()
        .filter(|discount| *discount > 0)
        .map(|discount| format!("-{}", format_money(discount)))
        .unwrap_or_default();

    Ok([
        format!("#{:<3}", idx + 1),
        item.name().to_string(),
        options,
        item.quantity().to_string(),
        format_money(item.base_price()),
        format_money(item.price()?),
        discount,
    ])
}

fn write_receipt_table(out: &mut impl io::Write, builder: Builder) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..7), Alignment::right());
    table.modify(Columns::new(2..3), color_dark_grey());

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(
    out: &mut impl io::Write,
    snapshot: &CheckoutSnapshot,
) -> Result<(), ReceiptError> {
    let discount_label = match &snapshot.coupon {
        Some(coupon) => format!(" Discount ({}):", coupon.code),
        None => " Discount:".to_string(),
    };

    let lines = [
        (" Subtotal:".to_string(), format_money(snapshot.subtotal)),
        (
            format!(" Shipping ({}):", snapshot.shipping_method.title()),
            format_money(snapshot.shipping_cost),
        ),
        (discount_label, format!("-{}", format_money(snapshot.discount_total))),
        (" Tax:".to_string(), format_money(snapshot.tax_total)),
        (
            " \x1b[1mTotal:\x1b[0m".to_string(),
            format!("\x1b[1m{}\x1b[0m", format_money(snapshot.total)),
        ),
    ];

    let label_width = lines
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = lines
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or_default();

    for (label, value) in &lines {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and value.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {:>value_pad$}{value}  ",
        "", ""
    )
    .map_err(|_err| ReceiptError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}

#[cfg(test)]
mod tests {
    use jiff::Zoned;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        cart::{Cart, VariationSelection},
        checkout::{Address, BillingDetails, PricingContext, reconcile},
        coupons::{Coupon, DiscountType},
        shipping::ShippingRates,
    };

    use super::*;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut in_escape = false;

        for ch in s.chars() {
            if in_escape {
                if ch.is_ascii_alphabetic() {
                    in_escape = false;
                }
            } else if ch == '\x1b' {
                in_escape = true;
            } else {
                out.push(ch);
            }
        }

        out
    }

    fn priced() -> Result<CheckoutSnapshot, Box<dyn std::error::Error>> {
        let now: Zoned = "2025-03-01T12:00:00-05:00[America/New_York]".parse()?;
        let rates = ShippingRates::default();

        let bumper = CartItem::new(101, "Pole Bumper", 3_500, 2)?
            .with_variations([VariationSelection::new("Color", "Navy")]);

        let snapshot = CheckoutSnapshot {
            billing: BillingDetails {
                email: "skipper@example.com".to_string(),
                ..BillingDetails::default()
            },
            shipping: Address {
                postcode: "49423".to_string(),
                ..Address::default()
            },
            cart: Cart::with_items([bumper])?,
            coupon: Some(Coupon::new("TEN", DiscountType::Percent, Decimal::TEN)),
            ..CheckoutSnapshot::default()
        };

        Ok(reconcile(&snapshot, &PricingContext::new(&rates, &now))?)
    }

    #[test]
    fn write_to_renders_lines_and_totals() -> TestResult {
        let snapshot = priced()?;
        let mut out = Vec::new();

        Receipt::new(&snapshot).write_to(&mut out)?;

        let rendered = strip_ansi(&String::from_utf8(out)?);

        assert!(rendered.contains("Pole Bumper"), "missing item name:\n{rendered}");
        assert!(rendered.contains("Color: Navy"), "missing variation:\n{rendered}");
        assert!(rendered.contains("$35.00"), "missing unit price:\n{rendered}");
        assert!(rendered.contains("$70.00"), "missing line price:\n{rendered}");
        assert!(rendered.contains("Shipping (Flat rate):"), "missing shipping:\n{rendered}");
        assert!(rendered.contains("Discount (TEN):"), "missing coupon code:\n{rendered}");
        assert!(rendered.contains("-$7.00"), "missing discount:\n{rendered}");
        assert!(rendered.contains("$73.00"), "missing total:\n{rendered}");

        Ok(())
    }

    #[test]
    fn visible_width_ignores_escape_codes() {
        assert_eq!(visible_width("\x1b[1mTotal:\x1b[0m"), 6);
        assert_eq!(visible_width(" Tax:"), 5);
    }

    #[test]
    fn colorize_borders_wraps_box_runs() {
        assert_eq!(colorize_borders("─┼a"), "\x1b[90m─┼\x1b[0ma");
    }
}
