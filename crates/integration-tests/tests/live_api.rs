//! REST client against the dev API.
//!
//! These tests require:
//! - `TERMINAL_BEARER_TOKEN` for the dev environment
//! - Network access to `https://api.dev.terminal.shop`
//!
//! Run with: cargo test -p terminal-shop-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use terminal_shop::config::TerminalConfig;
use terminal_shop::{CommerceClient, TerminalClient, TerminalEnvironment, TerminalError};
use url::Url;

fn dev_client() -> TerminalClient {
    let token = std::env::var("TERMINAL_BEARER_TOKEN").unwrap();
    let config = TerminalConfig::new(
        Url::parse(TerminalEnvironment::Dev.base_url()).unwrap(),
        SecretString::from(token),
    );
    TerminalClient::new(&config).unwrap()
}

#[tokio::test]
#[ignore = "requires TERMINAL_BEARER_TOKEN and network access"]
async fn test_list_products() {
    let products = dev_client().list_products().await.unwrap();
    assert!(!products.is_empty());
    assert!(products.iter().all(|p| !p.variants.is_empty()));
}

#[tokio::test]
#[ignore = "requires TERMINAL_BEARER_TOKEN and network access"]
async fn test_cart_roundtrip() {
    let client = dev_client();
    let products = client.list_products().await.unwrap();
    let variant = &products[0].variants[0];

    client.clear_cart().await.unwrap();
    let cart = client.set_cart_item(&variant.id, 2).await.unwrap();
    assert_eq!(cart.amount.subtotal, variant.price * 2);

    client.clear_cart().await.unwrap();
    assert!(client.get_cart().await.unwrap().items.is_empty());
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_bad_token_is_unauthorized() {
    let config = TerminalConfig::new(
        Url::parse(TerminalEnvironment::Dev.base_url()).unwrap(),
        SecretString::from("trm_test_invalid"),
    );
    let client = TerminalClient::new(&config).unwrap();

    assert!(matches!(
        client.list_addresses().await,
        Err(TerminalError::Unauthorized)
    ));
}
