use std::{fs, io, path::PathBuf};

use clap::Args;
use estante_app::{
    context::AppContext,
    domain::checkout::{CheckoutError, CheckoutForm},
};

use super::{describe, load_cart};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Cart JSON, as a flat list of lines or an `itens` object
    #[arg(long)]
    cart: PathBuf,

    /// Checkout form YAML
    #[arg(long)]
    form: PathBuf,
}

pub(crate) async fn run(context: &AppContext, args: CheckoutArgs) -> Result<(), String> {
    let mut cart = load_cart(&args.cart)?;

    let yaml = fs::read_to_string(&args.form)
        .map_err(|error| format!("failed to read form {}: {error}", args.form.display()))?;

    let form: CheckoutForm = serde_norway::from_str(&yaml)
        .map_err(|error| format!("invalid form {}: {error}", args.form.display()))?;

    let session = context
        .sessions
        .current_session()
        .await
        .map_err(|error| format!("failed to read session: {}", describe(&error)))?;

    let confirmation = context
        .checkout()
        .submit(&mut cart, &form, session.as_ref())
        .await
        .map_err(|error| match error {
            CheckoutError::Validation(errors) => format!("please fix the checkout form: {errors}"),
            error => format!("failed to place order: {}", describe(&error)),
        })?;

    confirmation
        .receipt
        .write_to(io::stdout())
        .map_err(|error| format!("failed to print receipt: {error}"))?;

    println!();
    println!("order_uuid: {}", confirmation.order.uuid);

    if confirmation.anonymous_fallback {
        println!("note: the order was stored without your account");
    }

    if !confirmation.items_written {
        println!("note: the order lines could not be stored, we will follow up by email");
    }

    Ok(())
}
