//! REST implementation of [`CommerceClient`].
//!
//! Uses `reqwest` for HTTP. Nothing is cached here; list caching lives in
//! [`crate::catalog`] so invalidation stays in one place.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use terminal_shop_core::{AddressId, CardId, VariantId};
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    Address, AddressCreate, Card, CardCollect, CartAddressInput, CartCardInput, CartItemInput,
    Envelope, Order, Product, RemoteCart,
};
use super::{CommerceClient, TerminalError};
use crate::config::{TerminalConfig, bearer_header};

/// Maximum number of response body characters kept in error messages.
const ERROR_BODY_PREVIEW: usize = 200;

/// Client for the Terminal commerce REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct TerminalClient {
    inner: Arc<TerminalClientInner>,
}

struct TerminalClientInner {
    client: reqwest::Client,
    base_url: Url,
    authorization: String,
}

/// Error body returned by the API on non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl TerminalClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TerminalConfig) -> Result<Self, TerminalError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("terminal-shop/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(TerminalClientInner {
                client: builder.build()?,
                base_url: directory_url(&config.base_url),
                authorization: bearer_header(config),
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, TerminalError> {
        let url = self.inner.base_url.join(path)?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .header(header::AUTHORIZATION, &self.inner.authorization)
            .header(header::ACCEPT, "application/json"))
    }

    /// Send a request and unwrap the `data` envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, TerminalError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(TerminalError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope.data),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %preview(&body, 500),
                    "Failed to parse Terminal API response"
                );
                Err(TerminalError::Parse(e))
            }
        }
    }
}

/// Map a non-success response to a [`TerminalError`].
fn error_for_status(status: StatusCode, body: &str) -> TerminalError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TerminalError::Unauthorized,
        StatusCode::NOT_FOUND => TerminalError::NotFound(error_message(body)),
        _ => {
            tracing::warn!(
                status = %status,
                body = %preview(body, 500),
                "Terminal API returned non-success status"
            );
            TerminalError::Api {
                status: status.as_u16(),
                message: error_message(body),
            }
        }
    }
}

/// Extract the most useful message from an error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorBody {
            code: Some(code), ..
        }) => code,
        _ if body.trim().is_empty() => "(empty response body)".to_string(),
        _ => preview(body, ERROR_BODY_PREVIEW),
    }
}

fn preview(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

#[async_trait]
impl CommerceClient for TerminalClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, TerminalError> {
        let products: Vec<Product> = self.send(self.request(Method::GET, "product")?).await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn list_addresses(&self) -> Result<Vec<Address>, TerminalError> {
        self.send(self.request(Method::GET, "address")?).await
    }

    #[instrument(skip(self, input), fields(city = %input.city, country = %input.country))]
    async fn create_address(&self, input: &AddressCreate) -> Result<AddressId, TerminalError> {
        self.send(self.request(Method::POST, "address")?.json(input))
            .await
    }

    #[instrument(skip(self), fields(address_id = %id))]
    async fn delete_address(&self, id: &AddressId) -> Result<(), TerminalError> {
        let _: serde_json::Value = self
            .send(self.request(Method::DELETE, &format!("address/{id}"))?)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_cards(&self) -> Result<Vec<Card>, TerminalError> {
        self.send(self.request(Method::GET, "card")?).await
    }

    #[instrument(skip(self))]
    async fn collect_card(&self) -> Result<CardCollect, TerminalError> {
        self.send(self.request(Method::POST, "card/collect")?).await
    }

    #[instrument(skip(self), fields(card_id = %id))]
    async fn delete_card(&self, id: &CardId) -> Result<(), TerminalError> {
        let _: serde_json::Value = self
            .send(self.request(Method::DELETE, &format!("card/{id}"))?)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), TerminalError> {
        let _: serde_json::Value = self.send(self.request(Method::DELETE, "cart")?).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(variant_id = %variant_id))]
    async fn set_cart_item(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<RemoteCart, TerminalError> {
        let body = CartItemInput {
            product_variant_id: variant_id,
            quantity,
        };
        self.send(self.request(Method::PUT, "cart/item")?.json(&body))
            .await
    }

    #[instrument(skip(self))]
    async fn set_cart_address(
        &self,
        address_id: Option<&AddressId>,
    ) -> Result<RemoteCart, TerminalError> {
        let body = CartAddressInput { address_id };
        self.send(self.request(Method::PUT, "cart/address")?.json(&body))
            .await
    }

    #[instrument(skip(self))]
    async fn set_cart_card(&self, card_id: Option<&CardId>) -> Result<RemoteCart, TerminalError> {
        let body = CartCardInput { card_id };
        self.send(self.request(Method::PUT, "cart/card")?.json(&body))
            .await
    }

    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<RemoteCart, TerminalError> {
        self.send(self.request(Method::GET, "cart")?).await
    }

    #[instrument(skip(self))]
    async fn convert_cart(&self) -> Result<Order, TerminalError> {
        self.send(self.request(Method::POST, "cart/convert")?).await
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, TerminalError> {
        self.send(self.request(Method::GET, "order")?).await
    }
}

/// Ensure the base path ends in `/` so joined paths extend it instead of
/// replacing its last segment.
fn directory_url(base: &Url) -> Url {
    let mut url = base.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(base: &str) -> TerminalClient {
        let config = TerminalConfig::new(Url::parse(base).unwrap(), SecretString::from("tok"));
        TerminalClient::new(&config).unwrap()
    }

    #[test]
    fn test_base_url_path_is_kept() {
        let c = client("http://localhost:8080/v1");
        assert_eq!(c.base_url().as_str(), "http://localhost:8080/v1/");

        let request = c
            .request(Method::GET, "product")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8080/v1/product");

        let request = client("http://localhost:8080/v1/")
            .request(Method::DELETE, "card/crd_1")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8080/v1/card/crd_1");
    }

    #[test]
    fn test_request_urls_resolve_against_base() {
        let client = client("https://api.dev.terminal.shop");
        let request = client
            .request(Method::GET, "address/shp_1")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://api.dev.terminal.shop/address/shp_1"
        );
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer tok"
        );
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        assert_eq!(
            error_message(r#"{"code":"invalid_address","message":"Address required"}"#),
            "Address required"
        );
        assert_eq!(error_message(r#"{"code":"invalid_card"}"#), "invalid_card");
        assert_eq!(error_message(""), "(empty response body)");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_error_for_status_maps_auth_and_not_found() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, ""),
            TerminalError::Unauthorized
        ));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, r#"{"message":"no such card"}"#),
            TerminalError::NotFound(m) if m == "no such card"
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, r#"{"message":"bad"}"#),
            TerminalError::Api { status: 400, .. }
        ));
    }
}
