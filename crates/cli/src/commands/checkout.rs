//! One-shot checkout: build the cart, show the total, place the order.

use std::io::{BufRead, Write};

use clap::Args;
use terminal_shop::ShopSession;
use terminal_shop_core::{AddressId, CardId};

use super::{CliError, address_ref, card_ref, parse_item};

#[derive(Args)]
pub struct CheckoutArgs {
    /// Variant to buy, as VARIANT or VARIANT:QTY (repeatable)
    #[arg(long = "item", required = true)]
    items: Vec<String>,
    /// Shipping address ID
    #[arg(long)]
    address: Option<String>,
    /// Payment card ID
    #[arg(long)]
    card: Option<String>,
    /// Place the order without asking
    #[arg(long, short = 'y')]
    yes: bool,
}

/// Total the requested cart and, once confirmed, place the order.
#[allow(clippy::print_stdout)]
pub async fn run(session: &mut ShopSession, args: CheckoutArgs) -> Result<(), CliError> {
    let items = args
        .items
        .iter()
        .map(|item| parse_item(item))
        .collect::<Result<Vec<_>, _>>()?;

    session.open_checkout();
    for (variant_id, quantity) in &items {
        for _ in 0..*quantity {
            session.add_variant(variant_id).await?;
        }
    }
    if let Some(id) = args.address {
        let address = address_ref(session, AddressId::new(id)).await?;
        session.select_address(address);
    }
    if let Some(id) = args.card {
        let card = card_ref(session, CardId::new(id)).await?;
        session.select_card(card);
    }

    for line in session.cart().lines() {
        println!("{} x{}  {}", line.title, line.quantity, line.description);
    }
    let total = session.calculate_total().await?;
    println!("Total: {total}");

    if !args.yes && !confirm("Place order?")? {
        session.close_checkout();
        println!("Order not placed");
        return Ok(());
    }

    let order = session.place_order().await?;
    println!("Order placed: {}", order.id);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn confirm(prompt: &str) -> Result<bool, CliError> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
