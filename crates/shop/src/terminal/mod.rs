//! Terminal commerce API client.
//!
//! # Architecture
//!
//! - [`CommerceClient`] is the seam the rest of the crate talks to; it is
//!   object-safe so sessions hold an `Arc<dyn CommerceClient>`
//! - [`TerminalClient`] implements it over the REST API with `reqwest`
//! - The commerce API is the source of truth - NO local persistence
//!
//! # Example
//!
//! ```rust,ignore
//! use terminal_shop::terminal::{CommerceClient, TerminalClient};
//!
//! let client = TerminalClient::new(&config.terminal)?;
//!
//! let products = client.list_products().await?;
//! client.set_cart_item(&products[0].variants[0].id, 1).await?;
//! let cart = client.get_cart().await?;
//! ```

mod client;
pub mod types;

pub use client::TerminalClient;
pub use types::*;

use async_trait::async_trait;
use terminal_shop_core::{AddressId, CardId, VariantId};
use thiserror::Error;

/// Errors that can occur when interacting with the commerce API.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token missing, expired, or revoked.
    #[error("Unauthorized: check TERMINAL_BEARER_TOKEN")]
    Unauthorized,

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Capability set consumed from the commerce API.
///
/// Every method either returns the resource or fails; callers treat any
/// failure as recoverable.
#[async_trait]
pub trait CommerceClient: Send + Sync {
    /// List all products in the catalog.
    async fn list_products(&self) -> Result<Vec<Product>, TerminalError>;

    /// List saved shipping addresses.
    async fn list_addresses(&self) -> Result<Vec<Address>, TerminalError>;

    /// Create a shipping address, returning its ID.
    async fn create_address(&self, input: &AddressCreate) -> Result<AddressId, TerminalError>;

    /// Delete a shipping address.
    async fn delete_address(&self, id: &AddressId) -> Result<(), TerminalError>;

    /// List saved payment cards.
    async fn list_cards(&self) -> Result<Vec<Card>, TerminalError>;

    /// Start out-of-band card collection, returning the entry URL.
    async fn collect_card(&self) -> Result<CardCollect, TerminalError>;

    /// Delete a payment card.
    async fn delete_card(&self, id: &CardId) -> Result<(), TerminalError>;

    /// Remove every item and selection from the remote cart.
    async fn clear_cart(&self) -> Result<(), TerminalError>;

    /// Set the quantity of one variant in the remote cart.
    async fn set_cart_item(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<RemoteCart, TerminalError>;

    /// Set the shipping address of the remote cart.
    ///
    /// `None` is forwarded as an absent ID; the API is expected to reject it.
    async fn set_cart_address(
        &self,
        address_id: Option<&AddressId>,
    ) -> Result<RemoteCart, TerminalError>;

    /// Set the payment card of the remote cart.
    ///
    /// `None` is forwarded as an absent ID; the API is expected to reject it.
    async fn set_cart_card(&self, card_id: Option<&CardId>) -> Result<RemoteCart, TerminalError>;

    /// Fetch the remote cart with computed shipping and totals.
    async fn get_cart(&self) -> Result<RemoteCart, TerminalError>;

    /// Convert the remote cart into an order.
    async fn convert_cart(&self) -> Result<Order, TerminalError>;

    /// List placed orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, TerminalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_error_display() {
        let err = TerminalError::NotFound("prd_123".to_string());
        assert_eq!(err.to_string(), "Not found: prd_123");

        let err = TerminalError::Api {
            status: 400,
            message: "address required".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400): address required");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = TerminalError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
