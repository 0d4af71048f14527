//! Checkout form protocol over JSON lines.
//!
//! Each stdin line is either a form message (`submitAddress`,
//! `calculateTotal`, `placeOrder`, `close`) or a host command (`addItem`,
//! `removeItem`, `selectAddress`, `selectCard`), all shaped
//! `{"command": ..., "payload": ...}`. Each reply is written as one stdout
//! line. The bridge exits on `close` or end of input.
//!
//! ```text
//! > {"command":"addItem","payload":"var_01J1"}
//! < {"command":"updateCart","payload":{"products":[...],"selectedAddress":null,"selectedCard":null}}
//! > {"command":"calculateTotal","payload":{"products":[{"id":"var_01J1","quantity":1}]}}
//! < {"command":"calculateTotal","payload":"$22.00"}
//! ```

use clap::Args;
use serde::Deserialize;
use terminal_shop::{InboundMessage, OutboundMessage, Reply, ShopEvent, ShopSession};
use terminal_shop_core::{AddressId, CardId, VariantId};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::Receiver;
use tracing::{info, warn};

use super::{CliError, address_ref, card_ref};

#[derive(Args)]
pub struct BridgeArgs {
    /// Do not send the initial `updateCart` on start
    #[arg(long)]
    quiet_start: bool,
}

/// Commands a host sends on behalf of its tree views.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "camelCase")]
enum HostCommand {
    AddItem(VariantId),
    RemoveItem(VariantId),
    SelectAddress(AddressId),
    SelectCard(CardId),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BridgeInput {
    Form(InboundMessage),
    Host(HostCommand),
}

/// Run the bridge until `close` or end of input.
pub async fn run(session: &mut ShopSession, args: BridgeArgs) -> Result<(), CliError> {
    let mut events = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let opened = session.open_checkout();
    if !args.quiet_start {
        write_json(&mut stdout, &opened).await?;
    }

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let input = match serde_json::from_str::<BridgeInput>(&line) {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "Ignoring unrecognized bridge input");
                continue;
            }
        };

        let replies = match input {
            BridgeInput::Form(message) => session.handle_message(message).await,
            BridgeInput::Host(command) => host_command(session, command)
                .await
                .map(Reply::Post)
                .into_iter()
                .collect(),
        };

        let mut dispose = false;
        for reply in replies {
            match reply {
                Reply::Post(message) => write_json(&mut stdout, &message).await?,
                Reply::Form(status) => write_json(&mut stdout, &status).await?,
                Reply::Dispose => dispose = true,
            }
        }
        log_events(&mut events);

        if dispose {
            break;
        }
    }

    info!("Bridge closed");
    Ok(())
}

/// Apply a host command. Failures are already published as events.
async fn host_command(session: &mut ShopSession, command: HostCommand) -> Option<OutboundMessage> {
    match command {
        HostCommand::AddItem(variant_id) => session.add_variant(&variant_id).await.ok(),
        HostCommand::RemoveItem(variant_id) => session.remove_item(&variant_id),
        HostCommand::SelectAddress(id) => match address_ref(session, id).await {
            Ok(address) => Some(session.select_address(address)),
            Err(e) => {
                warn!(error = %e, "Could not load addresses");
                None
            }
        },
        HostCommand::SelectCard(id) => match card_ref(session, id).await {
            Ok(card) => Some(session.select_card(card)),
            Err(e) => {
                warn!(error = %e, "Could not load cards");
                None
            }
        },
    }
}

fn log_events(events: &mut Receiver<ShopEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            ShopEvent::OrderPlaced { order_id } => info!(order_id = %order_id, "Order placed"),
            ShopEvent::Error { message } => warn!(%message, "Shop error"),
            ShopEvent::CartChanged(_) => {}
        }
    }
}

async fn write_json<T: serde::Serialize>(
    stdout: &mut tokio::io::Stdout,
    value: &T,
) -> Result<(), CliError> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_input_distinguishes_form_and_host() {
        let input: BridgeInput =
            serde_json::from_str(r#"{"command":"placeOrder"}"#).unwrap();
        assert!(matches!(input, BridgeInput::Form(InboundMessage::PlaceOrder)));

        let input: BridgeInput =
            serde_json::from_str(r#"{"command":"addItem","payload":"var_1"}"#).unwrap();
        assert!(matches!(
            input,
            BridgeInput::Host(HostCommand::AddItem(ref id)) if id.as_str() == "var_1"
        ));
    }
}
