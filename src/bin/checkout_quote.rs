//! Checkout Quote
//!
//! Plays a checkout scenario file and prints the priced receipt.
//!
//! Use `--rates` to load a shipping tier table, `--at` to price at a different moment and
//! `--payload` to print the `WooCommerce` order body that would be submitted.

use std::{io, path::PathBuf};

use anyhow::{Result, bail};
use clap::Parser;
use dockbloxx_checkout::{
    config::CheckoutConfig,
    fixtures::Scenario,
    logging::{LoggingConfig, init_subscriber},
    money::format_money,
    receipt::Receipt,
    woocommerce::OrderPayload,
};
use tracing::info;

/// Price a checkout scenario.
#[derive(Debug, Parser)]
#[command(name = "checkout-quote", about = "Price a checkout scenario", long_about = None)]
struct Cli {
    /// Scenario YAML file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Checkout config YAML with the shipping tier table
    #[arg(short, long, env = "CHECKOUT_SHIPPING_RATES")]
    rates: Option<PathBuf>,

    /// Price at this zoned time instead of the scenario's, e.g.
    /// `2025-03-01T12:00:00-05:00[America/New_York]`
    #[arg(long)]
    at: Option<String>,

    /// Also print the order payload as JSON
    #[arg(long)]
    payload: bool,

    #[command(flatten)]
    logging: LoggingConfig,
}

#[expect(clippy::print_stdout, reason = "CLI output")]
fn main() -> Result<()> {
    _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_subscriber(&cli.logging)?;

    let config = match &cli.rates {
        Some(path) => CheckoutConfig::from_path(path)?,
        None => CheckoutConfig::default(),
    };

    let mut scenario = Scenario::from_path(&cli.scenario)?;

    if let Some(at) = cli.at {
        scenario.now = Some(at);
    }

    info!(scenario = %scenario.name, items = scenario.items.len(), "pricing scenario");

    let outcome = scenario.run(&config.shipping)?;

    if !scenario.name.is_empty() {
        println!("{}", scenario.name);
    }

    if let Some(rejection) = &outcome.rejection {
        println!("\nCoupon rejected: {rejection}");
    }

    Receipt::new(&outcome.snapshot).write_to(io::stdout().lock())?;

    if cli.payload {
        let payload = OrderPayload::try_from(&outcome.snapshot)?;

        println!("{}", serde_json::to_string_pretty(&payload)?);
    }

    let Some(expect) = &scenario.expect else {
        return Ok(());
    };

    let totals = expect.totals()?;
    let snapshot = &outcome.snapshot;
    let mut mismatches = Vec::new();

    for (label, expected, actual) in [
        ("subtotal", totals.subtotal, snapshot.subtotal),
        ("discount", totals.discount_total, snapshot.discount_total),
        ("shipping", totals.shipping_cost, snapshot.shipping_cost),
        ("total", totals.total, snapshot.total),
    ] {
        if let Some(expected) = expected.filter(|expected| *expected != actual) {
            mismatches.push(format!(
                "{label}: expected {}, got {}",
                format_money(expected),
                format_money(actual)
            ));
        }
    }

    if let Some(method) = expect
        .shipping_method
        .filter(|method| *method != snapshot.shipping_method)
    {
        mismatches.push(format!(
            "shipping method: expected {}, got {}",
            method.id(),
            snapshot.shipping_method.id()
        ));
    }

    if expect.rejected != outcome.rejection.is_some() {
        mismatches.push(format!(
            "coupon rejection: expected {}, got {}",
            expect.rejected,
            outcome.rejection.is_some()
        ));
    }

    if !mismatches.is_empty() {
        bail!("scenario expectations not met:\n  {}", mismatches.join("\n  "));
    }

    println!("All expectations met.");

    Ok(())
}
