//! Application configuration

use std::{convert::Infallible, path::PathBuf};

use clap::Args;
use decimal_percentage::Percentage;
use estante::{discounts::PaymentDiscounts, payment::PaymentMethod};
use rust_decimal::Decimal;
use zeroize::Zeroizing;

use crate::domain::orders::ItemFailurePolicy;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// External collaborator settings. Without a URL an in-memory backend is used.
#[derive(Debug, Args)]
pub struct BackendConfig {
    /// Collaborator project URL
    #[arg(long, env = "ESTANTE_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    /// Collaborator public API key
    #[arg(
        long,
        env = "ESTANTE_BACKEND_KEY",
        hide_env_values = true,
        value_parser = secret,
        global = true
    )]
    pub backend_key: Option<Zeroizing<String>>,

    /// Access token of the signed-in customer
    #[arg(
        long,
        env = "ESTANTE_ACCESS_TOKEN",
        hide_env_values = true,
        value_parser = secret,
        global = true
    )]
    pub access_token: Option<Zeroizing<String>>,
}

/// Checkout behavior settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// What to do when an order header is stored but its items are not
    #[arg(
        long,
        env = "ESTANTE_ITEM_FAILURE",
        value_enum,
        default_value_t = ItemFailurePolicy::FailSoft,
        global = true
    )]
    pub item_failure: ItemFailurePolicy,

    /// Percentage taken off pix payments, between 0 and 100
    #[arg(
        long,
        env = "ESTANTE_PIX_DISCOUNT",
        default_value = "5",
        value_parser = discount_percent,
        global = true
    )]
    pub pix_discount: Decimal,

    /// YAML catalog of books
    #[arg(
        long,
        env = "ESTANTE_CATALOG",
        default_value = "fixtures/catalog.yml",
        global = true
    )]
    pub catalog: PathBuf,
}

impl CheckoutConfig {
    /// Payment discounts configured for checkout.
    #[must_use]
    pub fn payment_discounts(&self) -> PaymentDiscounts {
        if self.pix_discount <= Decimal::ZERO {
            return PaymentDiscounts::none();
        }

        let percent = self.pix_discount.min(Decimal::ONE_HUNDRED);

        PaymentDiscounts::none().with_rate(
            PaymentMethod::Pix,
            Percentage::from(percent / Decimal::ONE_HUNDRED),
        )
    }
}

fn discount_percent(value: &str) -> Result<Decimal, String> {
    let percent: Decimal = value
        .trim()
        .parse()
        .map_err(|err| format!("not a number: {err}"))?;

    if (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&percent) {
        Ok(percent)
    } else {
        Err(format!("{percent} is not between 0 and 100"))
    }
}

fn secret(value: &str) -> Result<Zeroizing<String>, Infallible> {
    Ok(Zeroizing::new(value.to_string()))
}
