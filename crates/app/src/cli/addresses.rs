use clap::{Args, Subcommand};
use estante_app::{
    backend::{AddressUuid, Session},
    context::AppContext,
};

use super::describe;

#[derive(Debug, Args)]
pub(crate) struct AddressesCommand {
    #[command(subcommand)]
    command: AddressesSubcommand,
}

#[derive(Debug, Subcommand)]
enum AddressesSubcommand {
    List,
    SetDefault(SetDefaultArgs),
}

#[derive(Debug, Args)]
pub(crate) struct SetDefaultArgs {
    /// Address UUID
    #[arg(long)]
    uuid: AddressUuid,
}

pub(crate) async fn run(context: &AppContext, command: AddressesCommand) -> Result<(), String> {
    let session = signed_in(context).await?;
    let customer = session.customer.uuid;

    match command.command {
        AddressesSubcommand::List => {
            let addresses = context
                .addresses
                .list_addresses(customer)
                .await
                .map_err(|error| format!("failed to list addresses: {}", describe(&error)))?;

            for record in addresses {
                let marker = if record.is_default { "*" } else { " " };

                println!("{marker} {} {}", record.uuid, record.address.formatted());
            }

            Ok(())
        }
        AddressesSubcommand::SetDefault(args) => {
            context
                .addresses
                .set_default(customer, args.uuid)
                .await
                .map_err(|error| format!("failed to set default address: {}", describe(&error)))?;

            println!("default_address: {}", args.uuid);

            Ok(())
        }
    }
}

async fn signed_in(context: &AppContext) -> Result<Session, String> {
    context
        .sessions
        .current_session()
        .await
        .map_err(|error| format!("failed to read session: {}", describe(&error)))?
        .ok_or_else(|| "sign in to manage saved addresses".to_string())
}
