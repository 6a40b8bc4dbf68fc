//! Config
//!
//! Store configuration read from YAML. Amounts are dollar strings, as in the storefront admin.
//!
//! ```yaml
//! shipping:
//!   tiers:
//!     - min_subtotal: "0"
//!       cost: "10.00"
//!     - min_subtotal: "100.00"
//!       cost: "20.00"
//! ```

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    money::{PricingError, parse_amount},
    shipping::{ShippingRates, ShippingRatesError, ShippingTier},
};

/// Config loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A tier amount is not a decimal dollar amount
    #[error("Invalid shipping tier amount: {0}")]
    Amount(#[from] PricingError),

    /// The tier table is not usable
    #[error("Invalid shipping rates: {0}")]
    Rates(#[from] ShippingRatesError),
}

/// Checkout configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Flat-rate shipping table
    pub shipping: ShippingRates,
}

impl CheckoutConfig {
    /// Parse configuration from a YAML string. Missing sections fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the YAML is malformed or describes an invalid tier table.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_norway::from_str(yaml)?;

        let shipping = match file.shipping {
            Some(shipping) => shipping.try_into()?,
            None => ShippingRates::default(),
        };

        Ok(Self { shipping })
    }

    /// Read configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or is not valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    shipping: Option<ShippingConfig>,
}

#[derive(Debug, Deserialize)]
struct ShippingConfig {
    tiers: Vec<TierConfig>,
}

#[derive(Debug, Deserialize)]
struct TierConfig {
    min_subtotal: String,
    cost: String,
}

impl TryFrom<ShippingConfig> for ShippingRates {
    type Error = ConfigError;

    fn try_from(config: ShippingConfig) -> Result<Self, Self::Error> {
        let tiers = config
            .tiers
            .iter()
            .map(|tier| {
                Ok(ShippingTier::new(
                    parse_amount(&tier.min_subtotal)?,
                    parse_amount(&tier.cost)?,
                ))
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        Ok(ShippingRates::new(tiers)?)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn empty_config_uses_default_rates() -> TestResult {
        let config = CheckoutConfig::from_yaml_str("{}")?;

        assert_eq!(config.shipping, ShippingRates::default());

        Ok(())
    }

    #[test]
    fn parses_dollar_tiers() -> TestResult {
        let yaml = r#"
shipping:
  tiers:
    - min_subtotal: "0"
      cost: "12.50"
    - min_subtotal: "150.00"
      cost: "0"
"#;

        let config = CheckoutConfig::from_yaml_str(yaml)?;

        assert_eq!(config.shipping.flat_rate(14_999), 1_250);
        assert_eq!(config.shipping.flat_rate(15_000), 0);

        Ok(())
    }

    #[test]
    fn rejects_bad_amount() {
        let yaml = r#"
shipping:
  tiers:
    - min_subtotal: "0"
      cost: "ten dollars"
"#;

        assert!(matches!(
            CheckoutConfig::from_yaml_str(yaml),
            Err(ConfigError::Amount(PricingError::InvalidAmount(_)))
        ));
    }

    #[test]
    fn rejects_unordered_tiers() {
        let yaml = r#"
shipping:
  tiers:
    - min_subtotal: "0"
      cost: "10"
    - min_subtotal: "0"
      cost: "20"
"#;

        assert!(matches!(
            CheckoutConfig::from_yaml_str(yaml),
            Err(ConfigError::Rates(ShippingRatesError::Unordered(1)))
        ));
    }

    #[test]
    fn reads_config_file() -> TestResult {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("checkout.yaml");

        fs::write(&path, "shipping:\n  tiers:\n    - min_subtotal: \"0\"\n      cost: \"5\"\n")?;

        let config = CheckoutConfig::from_path(&path)?;

        assert_eq!(config.shipping.flat_rate(100_000), 500);

        Ok(())
    }
}
