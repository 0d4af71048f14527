//! Checkout flow against the in-memory commerce API.
//!
//! Covers totaling (clear-then-rebuild, all-or-nothing), invalidation on
//! cart changes, and order placement with retry.

#![allow(clippy::unwrap_used)]

use terminal_shop::checkout::SyncStep;
use terminal_shop::{
    AddressRef, CardRef, CheckoutError, CheckoutState, ShopError, ShopEvent, ShopSession,
};
use terminal_shop_core::VariantId;
use terminal_shop_integration_tests::{
    Call, Endpoint, FakeTerminal, sample_address, sample_card,
};
use tokio::sync::broadcast::Receiver;

fn v(id: &str) -> VariantId {
    VariantId::new(id)
}

fn drain(events: &mut Receiver<ShopEvent>) -> Vec<ShopEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn error_count(events: &[ShopEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ShopEvent::Error { .. }))
        .count()
}

/// Session with Cron x1 and Flow 12oz x2, address and card selected.
async fn ready_session(fake: &FakeTerminal) -> ShopSession {
    let mut session = fake.session();
    session.open_checkout();
    session.add_variant(&v("var_cron_12oz")).await.unwrap();
    session.add_variant(&v("var_flow_12oz")).await.unwrap();
    session.add_variant(&v("var_flow_12oz")).await.unwrap();
    session.select_address(AddressRef::from(&sample_address()));
    session.select_card(CardRef::from(&sample_card()));
    session
}

// ============================================================================
// Totaling
// ============================================================================

#[tokio::test]
async fn test_total_includes_items_and_shipping() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;

    let total = session.calculate_total().await.unwrap();

    // 25.00 + 2 x 22.00 + 8.00 shipping
    assert_eq!(total, "$77.00");
    assert_eq!(session.total(), "$77.00");
    assert!(matches!(
        session.checkout_state(),
        CheckoutState::Totaled { total } if total == "$77.00"
    ));
    assert_eq!(
        fake.cart_items(),
        vec![(v("var_cron_12oz"), 1), (v("var_flow_12oz"), 2)]
    );
}

#[tokio::test]
async fn test_clear_runs_before_every_upsert() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    fake.clear_calls();

    session.calculate_total().await.unwrap();

    let calls = fake.calls();
    assert_eq!(calls.first(), Some(&Call::ClearCart));
    assert_eq!(calls.last(), Some(&Call::GetCart));
    assert_eq!(calls.len(), 6);
    assert_eq!(fake.count(Endpoint::ClearCart), 1);
    assert_eq!(fake.count(Endpoint::SetItem), 2);
    assert!(calls.contains(&Call::SetItem(v("var_flow_12oz"), 2)));
    assert_eq!(fake.count(Endpoint::SetAddress), 1);
    assert_eq!(fake.count(Endpoint::SetCard), 1);
}

#[tokio::test]
async fn test_retotal_rebuilds_remote_cart_from_scratch() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    session.calculate_total().await.unwrap();

    session.remove_item(&v("var_cron_12oz"));
    let total = session.calculate_total().await.unwrap();

    assert_eq!(total, "$52.00");
    assert_eq!(fake.cart_items(), vec![(v("var_flow_12oz"), 2)]);
}

#[tokio::test]
async fn test_missing_card_rejected_returns_to_idle() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();
    session.open_checkout();
    session.add_variant(&v("var_cron_12oz")).await.unwrap();
    session.select_address(AddressRef::from(&sample_address()));
    let cart_before = session.cart().clone();
    let mut events = session.subscribe();

    let err = session.calculate_total().await.unwrap_err();

    match err {
        ShopError::Checkout(CheckoutError::Sync(sync)) => {
            assert_eq!(sync.failures.len(), 1);
            assert_eq!(sync.failures[0].step, SyncStep::Card);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(session.checkout_state(), &CheckoutState::Idle);
    assert_eq!(session.total(), "");
    assert_eq!(session.cart(), &cart_before);
    assert_eq!(error_count(&drain(&mut events)), 1);
    assert_eq!(fake.count(Endpoint::GetCart), 0);
}

#[tokio::test]
async fn test_batch_failures_are_aggregated() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    fake.fail_on(Endpoint::SetItem);
    let mut events = session.subscribe();

    let err = session.calculate_total().await.unwrap_err();

    let ShopError::Checkout(CheckoutError::Sync(sync)) = err else {
        panic!("expected sync error");
    };
    assert_eq!(sync.attempted, 5);
    assert_eq!(sync.failures.len(), 2);
    // Address and card were still attempted alongside the failing items.
    assert_eq!(fake.count(Endpoint::SetAddress), 1);
    assert_eq!(fake.count(Endpoint::SetCard), 1);
    assert_eq!(session.total(), "");
    assert_eq!(error_count(&drain(&mut events)), 1);
}

#[tokio::test]
async fn test_clear_failure_skips_batch() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    fake.fail_on(Endpoint::ClearCart);

    assert!(session.calculate_total().await.is_err());
    assert_eq!(fake.count(Endpoint::SetItem), 0);
    assert_eq!(session.checkout_state(), &CheckoutState::Idle);
}

#[tokio::test]
async fn test_failed_total_recovers_after_retry() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    fake.fail_on(Endpoint::GetCart);

    assert!(matches!(
        session.calculate_total().await,
        Err(ShopError::Checkout(CheckoutError::Total(_)))
    ));
    assert_eq!(session.checkout_state(), &CheckoutState::Idle);

    fake.recover(Endpoint::GetCart);
    assert_eq!(session.calculate_total().await.unwrap(), "$77.00");
}

// ============================================================================
// Invalidation
// ============================================================================

#[tokio::test]
async fn test_every_mutation_blanks_total() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;

    session.calculate_total().await.unwrap();
    session.add_item(&v("var_flow_2lb"), "Flow", "2lb Whole Beans");
    assert_eq!(session.checkout_state(), &CheckoutState::Idle);
    assert_eq!(session.total(), "");

    session.calculate_total().await.unwrap();
    session.remove_item(&v("var_flow_2lb"));
    assert_eq!(session.total(), "");

    session.calculate_total().await.unwrap();
    session.select_address(AddressRef::from(&sample_address()));
    assert_eq!(session.total(), "");

    session.calculate_total().await.unwrap();
    session.select_card(CardRef::from(&sample_card()));
    assert_eq!(session.total(), "");
}

#[tokio::test]
async fn test_removing_absent_variant_keeps_total() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    session.calculate_total().await.unwrap();

    assert!(session.remove_item(&v("var_missing")).is_none());
    assert_eq!(session.total(), "$77.00");
}

// ============================================================================
// Placing
// ============================================================================

#[tokio::test]
async fn test_place_order_resets_cart_and_notifies_once() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    session.calculate_total().await.unwrap();
    let mut events = session.subscribe();

    let order = session.place_order().await.unwrap();

    assert!(matches!(
        session.checkout_state(),
        CheckoutState::Completed { order_id } if order_id == &order.id
    ));
    assert!(session.cart().is_empty());
    assert!(session.cart().address_id().is_none());
    assert!(session.cart().card_id().is_none());
    assert_eq!(fake.orders().len(), 1);

    let placed: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, ShopEvent::OrderPlaced { .. }))
        .collect();
    assert_eq!(
        placed,
        vec![ShopEvent::OrderPlaced {
            order_id: order.id.clone()
        }]
    );
}

#[tokio::test]
async fn test_place_failure_keeps_total_and_cart() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    session.calculate_total().await.unwrap();
    let cart_before = session.cart().clone();
    fake.fail_on(Endpoint::ConvertCart);
    let mut events = session.subscribe();

    assert!(matches!(
        session.place_order().await,
        Err(ShopError::Checkout(CheckoutError::Place(_)))
    ));
    assert_eq!(session.total(), "$77.00");
    assert_eq!(session.cart(), &cart_before);
    assert_eq!(error_count(&drain(&mut events)), 1);

    fake.recover(Endpoint::ConvertCart);
    session.place_order().await.unwrap();
    assert!(session.cart().is_empty());
}

#[tokio::test]
async fn test_place_requires_total() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;

    assert!(matches!(
        session.place_order().await,
        Err(ShopError::Checkout(CheckoutError::InvalidState {
            action: "place order",
            state: "idle"
        }))
    ));
    assert_eq!(fake.count(Endpoint::ConvertCart), 0);
    assert_eq!(session.checkout_state(), &CheckoutState::Idle);
}

#[tokio::test]
async fn test_completed_flow_gives_way_to_fresh_one() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;
    session.calculate_total().await.unwrap();
    session.place_order().await.unwrap();

    session.open_checkout();
    assert_eq!(session.checkout_state(), &CheckoutState::Idle);

    session.add_variant(&v("var_cron_12oz")).await.unwrap();
    assert_eq!(session.cart().quantity(&v("var_cron_12oz")), 1);
    assert_eq!(session.checkout_state(), &CheckoutState::Idle);
}

#[tokio::test]
async fn test_order_history_refreshes_after_placing() {
    let fake = FakeTerminal::with_samples();
    let mut session = ready_session(&fake).await;

    assert!(session.order_tree().await.unwrap().is_empty());
    session.calculate_total().await.unwrap();
    session.place_order().await.unwrap();

    let tree = session.order_tree().await.unwrap();
    assert_eq!(fake.count(Endpoint::ListOrders), 2);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].label, "Order #1 - $77.00");
    assert_eq!(tree[0].children[0].label, "Cron (12oz Whole Beans)");
    assert_eq!(tree[0].children[1].description.as_deref(), Some("x2"));
}

#[tokio::test]
async fn test_unknown_variant_is_rejected() {
    let fake = FakeTerminal::with_samples();
    let mut session = fake.session();

    assert!(matches!(
        session.add_variant(&v("var_gone")).await,
        Err(ShopError::UnknownVariant(id)) if id == v("var_gone")
    ));
    assert!(session.cart().is_empty());
}
