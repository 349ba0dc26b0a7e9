use std::{error::Error, fs, path::Path};

use clap::{Parser, Subcommand};
use estante::{cart::Cart, legacy::LegacyCart};
use estante_app::{
    config::{BackendConfig, CheckoutConfig, LoggingConfig},
    context::AppContext,
    observability,
};
use rusty_money::iso;

mod addresses;
mod checkout;
mod order;
mod upsell;

#[derive(Debug, Parser)]
#[command(name = "estante", about = "Estante bookstore checkout CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(flatten)]
    backend: BackendConfig,

    #[command(flatten)]
    checkout: CheckoutConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Place an order for a cart
    Checkout(checkout::CheckoutArgs),

    /// Look up placed orders
    Order(order::OrderCommand),

    /// Manage the signed-in customer's saved addresses
    Addresses(addresses::AddressesCommand),

    /// Suggest books that bring a cart up to a bundle threshold
    Upsell(upsell::UpsellArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init(&self.logging).map_err(|error| error.to_string())?;

        let context = AppContext::from_config(&self.backend, &self.checkout)
            .map_err(|error| format!("failed to initialise: {error}"))?;

        match self.command {
            Commands::Checkout(args) => checkout::run(&context, args).await,
            Commands::Order(command) => order::run(&context, command).await,
            Commands::Addresses(command) => addresses::run(&context, command).await,
            Commands::Upsell(args) => upsell::run(&self.checkout, args),
        }
    }
}

/// `error` followed by each of its sources.
pub(crate) fn describe(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

/// Read a cart saved in either legacy JSON shape.
pub(crate) fn load_cart(path: &Path) -> Result<Cart, String> {
    let json = fs::read_to_string(path)
        .map_err(|error| format!("failed to read cart {}: {error}", path.display()))?;

    LegacyCart::from_json(&json)
        .and_then(|legacy| legacy.into_cart(iso::BRL))
        .map_err(|error| format!("invalid cart {}: {}", path.display(), describe(&error)))
}
