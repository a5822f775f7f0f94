//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HEIRLOOM_TAX_RATE` - Sales tax rate as a decimal fraction (e.g. `0.07`)
//!
//! ## Optional
//! - `HEIRLOOM_API_URL` - REST API base URL (default: `http://localhost:5000/api`)
//! - `HEIRLOOM_FREE_SHIPPING_THRESHOLD` - Subtotal above which shipping is free (default: 100)
//! - `HEIRLOOM_FLAT_SHIPPING` - Shipping charged at or below the threshold (default: 10)
//! - `HEIRLOOM_CURRENCY` - Display currency code (default: USD)
//! - `HEIRLOOM_DATA_DIR` - Directory for local storage (default: `.heirloom`)
//! - `STOREFRONT_REQUEST_TIMEOUT_SECS` - Per-request HTTP timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use heirloom_core::{CurrencyCode, Money};
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_DATA_DIR: &str = ".heirloom";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_FREE_SHIPPING_THRESHOLD: &str = "100";
const DEFAULT_FLAT_SHIPPING: &str = "10";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// REST API base URL (e.g. `https://api.example.com/api`)
    pub api_base_url: Url,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Directory holding the local storage file
    pub data_dir: PathBuf,
    /// Tax and shipping rules
    pub pricing: PricingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Tax and shipping rules used by the pricing calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    /// Tax rate as a fraction of the subtotal.
    pub tax_rate: Decimal,
    /// Shipping is free when the subtotal is strictly greater than this.
    pub free_shipping_threshold: Money,
    /// Shipping charged otherwise.
    pub flat_shipping: Money,
    /// Currency used for display and order submission.
    pub currency: CurrencyCode,
}

impl PricingConfig {
    /// Pricing rules with the standard shipping policy ($10 flat, free above
    /// $100) and the given tax rate.
    #[must_use]
    pub fn with_tax_rate(tax_rate: Decimal) -> Self {
        Self {
            tax_rate,
            free_shipping_threshold: Money::from_major(100),
            flat_shipping: Money::from_major(10),
            currency: CurrencyCode::USD,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let api_base_url = parse_api_url(&vars.or_default("HEIRLOOM_API_URL", DEFAULT_API_URL))?;
        let timeout_secs = vars
            .or_default(
                "STOREFRONT_REQUEST_TIMEOUT_SECS",
                &DEFAULT_TIMEOUT_SECS.to_string(),
            )
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "STOREFRONT_REQUEST_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let pricing = PricingConfig::from_vars(&vars)?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            data_dir: PathBuf::from(vars.or_default("HEIRLOOM_DATA_DIR", DEFAULT_DATA_DIR)),
            pricing,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Path of the local storage file inside the data directory.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }
}

impl PricingConfig {
    fn from_vars<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        let tax_rate = parse_decimal("HEIRLOOM_TAX_RATE", &vars.required("HEIRLOOM_TAX_RATE")?)?;
        if tax_rate.is_sign_negative() || tax_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "HEIRLOOM_TAX_RATE".to_string(),
                format!("must be in [0, 1), got {tax_rate}"),
            ));
        }

        let free_shipping_threshold = parse_money(
            "HEIRLOOM_FREE_SHIPPING_THRESHOLD",
            &vars.or_default(
                "HEIRLOOM_FREE_SHIPPING_THRESHOLD",
                DEFAULT_FREE_SHIPPING_THRESHOLD,
            ),
        )?;
        let flat_shipping = parse_money(
            "HEIRLOOM_FLAT_SHIPPING",
            &vars.or_default("HEIRLOOM_FLAT_SHIPPING", DEFAULT_FLAT_SHIPPING),
        )?;
        let currency = parse_currency(&vars.or_default("HEIRLOOM_CURRENCY", "USD"))?;

        Ok(Self {
            tax_rate,
            free_shipping_threshold,
            flat_shipping,
            currency,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source shared by the loaders.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse the API base URL, accepting only http(s) URLs.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("HEIRLOOM_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "HEIRLOOM_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn parse_decimal(key: &str, raw: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_money(key: &str, raw: &str) -> Result<Money, ConfigError> {
    let amount = parse_decimal(key, raw)?;
    if amount.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(Money::new(amount))
}

fn parse_currency(raw: &str) -> Result<CurrencyCode, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "USD" => Ok(CurrencyCode::USD),
        "EUR" => Ok(CurrencyCode::EUR),
        "GBP" => Ok(CurrencyCode::GBP),
        "CAD" => Ok(CurrencyCode::CAD),
        "AUD" => Ok(CurrencyCode::AUD),
        other => Err(ConfigError::InvalidEnvVar(
            "HEIRLOOM_CURRENCY".to_string(),
            format!("unsupported currency '{other}'"),
        )),
    }
}
