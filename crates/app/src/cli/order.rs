use clap::{Args, Subcommand};
use estante_app::{backend::OrderUuid, context::AppContext};

use super::describe;

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    Show(ShowOrderArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ShowOrderArgs {
    /// Order UUID
    #[arg(long)]
    uuid: OrderUuid,

    /// Contact email the order was placed with
    #[arg(long)]
    email: String,
}

pub(crate) async fn run(context: &AppContext, command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Show(args) => show(context, args).await,
    }
}

async fn show(context: &AppContext, args: ShowOrderArgs) -> Result<(), String> {
    let order = context
        .orders
        .get_order(args.uuid, args.email)
        .await
        .map_err(|error| format!("failed to load order: {}", describe(&error)))?;

    println!("reference: {}", order.reference());
    println!("status: {}", order.status);
    println!("placed_at: {}", order.created_at);
    println!("ship_to: {}", order.address_line);
    println!("payment_method: {}", order.payment_method);

    for item in &order.items {
        println!(
            "item: {} x {} @ {} = {}",
            item.quantity, item.title, item.unit_price, item.subtotal
        );
    }

    println!("subtotal: {}", order.subtotal);
    println!("total: {}", order.total);

    Ok(())
}
