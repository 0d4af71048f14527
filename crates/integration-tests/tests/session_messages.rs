//! Checkout form protocol, driven with the JSON a form would send.

#![allow(clippy::unwrap_used)]

use serde_json::{Value, json};
use terminal_shop::{
    AddressRef, CardRef, CheckoutState, FormStatus, InboundMessage, OutboundMessage, Reply,
    ShopEvent, ShopSession,
};
use terminal_shop_core::VariantId;
use terminal_shop_integration_tests::{Endpoint, FakeTerminal, sample_address, sample_card};

async fn send(session: &mut ShopSession, message: Value) -> Vec<Reply> {
    let message: InboundMessage = serde_json::from_value(message).unwrap();
    session.handle_message(message).await
}

fn posted(replies: &[Reply]) -> Vec<Value> {
    replies
        .iter()
        .filter_map(|r| match r {
            Reply::Post(message) => Some(serde_json::to_value(message).unwrap()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_open_then_add_posts_cart_snapshots() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();

    let opened = serde_json::to_value(session.open_checkout()).unwrap();
    assert_eq!(
        opened,
        json!({
            "command": "updateCart",
            "payload": {"products": [], "selectedAddress": null, "selectedCard": null}
        })
    );

    let added = session
        .add_variant(&VariantId::new("var_cron_12oz"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(added).unwrap()["payload"]["products"],
        json!([{
            "id": "var_cron_12oz",
            "title": "Cron",
            "description": "12oz Whole Beans",
            "quantity": 1
        }])
    );
}

#[tokio::test]
async fn test_full_checkout_over_messages() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();
    let mut events = session.subscribe();
    session.open_checkout();
    session
        .add_variant(&VariantId::new("var_flow_2lb"))
        .await
        .unwrap();
    session.select_address(AddressRef::from(&sample_address()));
    session.select_card(CardRef::from(&sample_card()));

    let replies = send(
        &mut session,
        json!({
            "command": "calculateTotal",
            "payload": {
                "products": [{"id": "var_flow_2lb", "quantity": 1}],
                "address": "shp_home",
                "card": "crd_visa"
            }
        }),
    )
    .await;
    assert_eq!(
        posted(&replies),
        vec![json!({"command": "calculateTotal", "payload": "$68.00"})]
    );

    let replies = send(&mut session, json!({"command": "placeOrder"})).await;
    assert_eq!(posted(&replies), vec![json!({"command": "orderPlaced"})]);
    assert!(session.cart().is_empty());

    let placed = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|e| matches!(e, ShopEvent::OrderPlaced { .. }))
        .count();
    assert_eq!(placed, 1);
}

#[tokio::test]
async fn test_failed_total_posts_blank_total() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();
    session.open_checkout();
    session
        .add_variant(&VariantId::new("var_cron_12oz"))
        .await
        .unwrap();

    // No address or card selected: the API rejects both.
    let replies = send(
        &mut session,
        json!({"command": "calculateTotal", "payload": {"products": []}}),
    )
    .await;

    assert_eq!(
        posted(&replies),
        vec![json!({"command": "calculateTotal", "payload": ""})]
    );
    assert_eq!(session.checkout_state(), &CheckoutState::Idle);
}

#[tokio::test]
async fn test_place_failure_reposts_kept_total() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();
    session.open_checkout();
    session
        .add_variant(&VariantId::new("var_cron_12oz"))
        .await
        .unwrap();
    session.select_address(AddressRef::from(&sample_address()));
    session.select_card(CardRef::from(&sample_card()));
    session.calculate_total().await.unwrap();
    fake.fail_on(Endpoint::ConvertCart);

    let replies = send(&mut session, json!({"command": "placeOrder"})).await;

    // The form re-enables Place Order on an inbound total.
    assert_eq!(
        posted(&replies),
        vec![json!({"command": "calculateTotal", "payload": "$33.00"})]
    );
    assert_eq!(session.total(), "$33.00");
    assert!(!session.cart().is_empty());

    fake.recover(Endpoint::ConvertCart);
    let replies = send(&mut session, json!({"command": "placeOrder"})).await;
    assert_eq!(posted(&replies), vec![json!({"command": "orderPlaced"})]);
}

#[tokio::test]
async fn test_submit_address_replies_with_status() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();

    let replies = send(
        &mut session,
        json!({
            "command": "submitAddress",
            "payload": {
                "name": "Grace Hopper",
                "street1": "1 Compiler Ct",
                "city": "Arlington",
                "province": "VA",
                "country": "US",
                "zip": "22201"
            }
        }),
    )
    .await;
    assert_eq!(replies, vec![Reply::Form(FormStatus::Success)]);
    assert_eq!(fake.count(Endpoint::CreateAddress), 1);

    let replies = send(
        &mut session,
        json!({
            "command": "submitAddress",
            "payload": {
                "name": "G",
                "street1": "1 Compiler Ct",
                "city": "Arlington",
                "country": "CA",
                "zip": "22201"
            }
        }),
    )
    .await;
    assert_eq!(replies, vec![Reply::Form(FormStatus::Error)]);
    assert_eq!(fake.count(Endpoint::CreateAddress), 1);
}

#[tokio::test]
async fn test_rejected_address_replies_error() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();
    fake.fail_on(Endpoint::CreateAddress);

    let replies = send(
        &mut session,
        json!({
            "command": "submitAddress",
            "payload": {
                "name": "Grace Hopper",
                "street1": "1 Compiler Ct",
                "city": "Arlington",
                "country": "US",
                "zip": "22201"
            }
        }),
    )
    .await;

    assert_eq!(replies, vec![Reply::Form(FormStatus::Error)]);
}

#[tokio::test]
async fn test_close_disposes_and_resets() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();
    session.open_checkout();
    session
        .add_variant(&VariantId::new("var_cron_12oz"))
        .await
        .unwrap();

    let replies = send(&mut session, json!({"command": "close"})).await;

    assert_eq!(replies, vec![Reply::Dispose]);
    assert!(!session.is_checkout_open());
    assert!(session.cart().is_empty());
    let reopened = session.open_checkout();
    assert!(matches!(reopened, OutboundMessage::UpdateCart(snapshot) if snapshot.is_empty()));
}
