//! Shipping address commands.
//!
//! # Usage
//!
//! ```bash
//! tshop addresses list
//! tshop addresses add --name "Ada Lovelace" --street1 "12 Analytical Way" \
//!     --city Austin --province TX --country US --zip 78701
//! tshop addresses delete shp_01J1
//! ```

use clap::{Args, Subcommand};
use terminal_shop::{AddressFields, ShopSession};
use terminal_shop_core::AddressId;
use tracing::info;

use super::{CliError, print_tree};

#[derive(Subcommand)]
pub enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add(AddressArgs),
    /// Delete a saved address
    Delete {
        /// Address ID
        id: String,
    },
}

#[derive(Args)]
pub struct AddressArgs {
    /// Recipient name
    #[arg(long)]
    name: String,
    /// Street address
    #[arg(long)]
    street1: String,
    /// Apartment, suite, etc.
    #[arg(long)]
    street2: Option<String>,
    #[arg(long)]
    city: String,
    /// State or province
    #[arg(long)]
    province: Option<String>,
    /// Country code (US or EU)
    #[arg(long, default_value = "US")]
    country: String,
    #[arg(long)]
    zip: String,
    #[arg(long)]
    phone: Option<String>,
}

impl From<AddressArgs> for AddressFields {
    fn from(args: AddressArgs) -> Self {
        Self {
            name: args.name,
            street1: args.street1,
            street2: args.street2,
            city: args.city,
            province: args.province,
            country: args.country,
            zip: args.zip,
            phone: args.phone,
        }
    }
}

/// Run an address subcommand.
#[allow(clippy::print_stdout)]
pub async fn run(session: &mut ShopSession, action: AddressAction, json: bool) -> Result<(), CliError> {
    match action {
        AddressAction::List => print_tree(&session.address_tree().await?, json)?,
        AddressAction::Add(args) => {
            let id = session.submit_address(&args.into()).await?;
            info!(address_id = %id, "Address created");
            println!("{id}");
        }
        AddressAction::Delete { id } => {
            session.delete_address(&AddressId::new(id)).await?;
            println!("Deleted");
        }
    }
    Ok(())
}
