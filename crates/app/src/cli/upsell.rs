use std::path::PathBuf;

use clap::Args;
use estante::{
    catalog::{Catalog, parse_price},
    upsell::{BundleThreshold, Shortfall, recommend},
};
use estante_app::config::CheckoutConfig;

use super::{describe, load_cart};

#[derive(Debug, Args)]
pub(crate) struct UpsellArgs {
    /// Cart JSON, as a flat list of lines or an `itens` object
    #[arg(long)]
    cart: PathBuf,

    /// Minimum number of copies for the bundle
    #[arg(long, conflicts_with = "spend", required_unless_present = "spend")]
    items: Option<u64>,

    /// Minimum cart total for the bundle, e.g. "150.00 BRL"
    #[arg(long)]
    spend: Option<String>,

    /// Maximum number of suggestions
    #[arg(long, default_value_t = 3)]
    limit: usize,
}

pub(crate) fn run(config: &CheckoutConfig, args: UpsellArgs) -> Result<(), String> {
    let catalog = Catalog::from_path(&config.catalog).map_err(|error| {
        format!(
            "failed to load catalog {}: {}",
            config.catalog.display(),
            describe(&error)
        )
    })?;

    let cart = load_cart(&args.cart)?;

    let threshold = match (args.items, args.spend) {
        (Some(items), _) => BundleThreshold::Items(items),
        (None, Some(spend)) => BundleThreshold::Spend(
            parse_price(&spend).map_err(|error| format!("invalid spend threshold: {error}"))?,
        ),
        (None, None) => return Err("either --items or --spend is required".to_string()),
    };

    let recommendation = recommend(&cart, catalog.books(), threshold, args.limit)
        .map_err(|error| format!("failed to recommend books: {error}"))?;

    let Some(recommendation) = recommendation else {
        println!("cart already qualifies");

        return Ok(());
    };

    match recommendation.shortfall {
        Shortfall::Items(items) => println!("missing_items: {items}"),
        Shortfall::Spend(amount) => println!("missing_spend: {amount}"),
    }

    for book in recommendation.books {
        println!("suggestion: {} by {} ({})", book.title, book.author, book.price);
    }

    Ok(())
}
