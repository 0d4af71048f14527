//! Payment card commands.
//!
//! Card numbers are never entered here; `collect` prints a link where the
//! card is entered out of band.

use clap::Subcommand;
use terminal_shop::ShopSession;
use terminal_shop_core::CardId;

use super::{CliError, print_tree};

#[derive(Subcommand)]
pub enum CardAction {
    /// List saved cards
    List,
    /// Print a link for adding a card
    Collect,
    /// Delete a saved card
    Delete {
        /// Card ID
        id: String,
    },
}

/// Run a card subcommand.
#[allow(clippy::print_stdout)]
pub async fn run(session: &mut ShopSession, action: CardAction, json: bool) -> Result<(), CliError> {
    match action {
        CardAction::List => print_tree(&session.card_tree().await?, json)?,
        CardAction::Collect => {
            let collect = session.collect_card().await?;
            println!("Add your card at: {}", collect.url);
        }
        CardAction::Delete { id } => {
            session.delete_card(&CardId::new(id)).await?;
            println!("Deleted");
        }
    }
    Ok(())
}
