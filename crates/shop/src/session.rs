//! One host session: cart, checkout flow, and cached lists behind a single
//! command surface.
//!
//! Every cart or selection change invalidates any computed total and returns
//! the `updateCart` message the checkout form should render. Failures are
//! logged, published once as [`ShopEvent::Error`], and returned to the caller;
//! the session has already rolled back by the time the caller sees them.

use std::sync::Arc;

use terminal_shop_core::{AddressId, CardId, OrderId, VariantId};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::cart::{AddressRef, Cart, CardRef, CartSnapshot};
use crate::catalog::{CacheKey, Catalog};
use crate::checkout::{CheckoutFlow, CheckoutState};
use crate::config::ShopConfig;
use crate::error::{Result, ShopError};
use crate::messages::{AddressFields, FormStatus, InboundMessage, OutboundMessage, TotalRequest};
use crate::terminal::{CardCollect, CommerceClient, Order, TerminalClient};
use crate::views::{self, TreeNode};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Notifications for observers outside the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopEvent {
    /// Cart lines or selections changed.
    CartChanged(CartSnapshot),
    /// An order was placed; order history is stale.
    OrderPlaced { order_id: OrderId },
    /// A recoverable failure to show the user.
    Error { message: String },
}

/// What the host should do after an inbound form message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Post a message to the checkout form.
    Post(OutboundMessage),
    /// Post a status to the address form.
    Form(FormStatus),
    /// Close the checkout surface.
    Dispose,
}

/// Session state for one presentation host.
pub struct ShopSession {
    client: Arc<dyn CommerceClient>,
    catalog: Catalog,
    cart: Cart,
    checkout: CheckoutFlow,
    checkout_open: bool,
    events: broadcast::Sender<ShopEvent>,
}

impl ShopSession {
    /// Create a session over any commerce client.
    #[must_use]
    pub fn new(client: Arc<dyn CommerceClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            catalog: Catalog::new(Arc::clone(&client)),
            client,
            cart: Cart::new(),
            checkout: CheckoutFlow::new(),
            checkout_open: false,
            events,
        }
    }

    /// Create a session talking to the REST API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ShopConfig) -> Result<Self> {
        let client = TerminalClient::new(&config.terminal)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Receive events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn checkout_state(&self) -> &CheckoutState {
        self.checkout.state()
    }

    /// Total shown in the checkout form, empty unless one is valid.
    #[must_use]
    pub fn total(&self) -> &str {
        self.checkout.total()
    }

    #[must_use]
    pub const fn is_checkout_open(&self) -> bool {
        self.checkout_open
    }

    // =========================================================================
    // Cart commands
    // =========================================================================

    /// Open (or re-show) the checkout surface.
    ///
    /// A completed flow is replaced by a fresh one.
    pub fn open_checkout(&mut self) -> OutboundMessage {
        if self.checkout.state().is_completed() {
            self.checkout = CheckoutFlow::new();
        }
        self.checkout_open = true;
        OutboundMessage::UpdateCart(self.cart.snapshot())
    }

    /// Close the checkout surface, discarding the cart and any total.
    pub fn close_checkout(&mut self) {
        self.checkout_open = false;
        self.checkout = CheckoutFlow::new();
        self.cart.reset();
        self.publish(ShopEvent::CartChanged(self.cart.snapshot()));
        debug!("Checkout closed");
    }

    /// Add one unit of a variant with explicit labels.
    pub fn add_item(
        &mut self,
        variant_id: &VariantId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> OutboundMessage {
        self.cart.add_item(variant_id, title, description);
        self.cart_changed()
    }

    /// Add one unit of a catalog variant, labelled from the catalog.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVariant` if the catalog has no such variant, or a
    /// terminal error if the catalog could not be fetched.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn add_variant(&mut self, variant_id: &VariantId) -> Result<OutboundMessage> {
        let found = self
            .catalog
            .find_variant(variant_id)
            .await
            .map_err(|e| self.fail(e))?;
        let Some(found) = found else {
            return Err(self.fail(ShopError::UnknownVariant(variant_id.clone())));
        };
        Ok(self.add_item(variant_id, found.product.name, found.variant.name))
    }

    /// Remove one unit of a variant. Returns `None` when it was not in the
    /// cart, in which case nothing changes.
    pub fn remove_item(&mut self, variant_id: &VariantId) -> Option<OutboundMessage> {
        self.cart
            .remove_item(variant_id)
            .then(|| self.cart_changed())
    }

    /// Select the shipping address, replacing any earlier choice.
    pub fn select_address(&mut self, address: AddressRef) -> OutboundMessage {
        self.cart.select_address(address);
        self.cart_changed()
    }

    /// Select the payment card, replacing any earlier choice.
    pub fn select_card(&mut self, card: CardRef) -> OutboundMessage {
        self.cart.select_card(card);
        self.cart_changed()
    }

    fn cart_changed(&mut self) -> OutboundMessage {
        if self.checkout.invalidate() {
            debug!("Cart changed, total cleared");
        }
        let snapshot = self.cart.snapshot();
        self.publish(ShopEvent::CartChanged(snapshot.clone()));
        OutboundMessage::UpdateCart(snapshot)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Rebuild the remote cart and compute its total.
    ///
    /// # Errors
    ///
    /// Returns a checkout error; the flow is back in `Idle` with no total.
    pub async fn calculate_total(&mut self) -> Result<String> {
        let result = self
            .checkout
            .calculate_total(self.client.as_ref(), &self.cart)
            .await;
        result.map_err(|e| self.fail(e))
    }

    /// Place the order for the totaled cart.
    ///
    /// # Errors
    ///
    /// Returns a checkout error; the flow keeps its total and the cart is
    /// untouched so the user may retry.
    pub async fn place_order(&mut self) -> Result<Order> {
        let result = self
            .checkout
            .place_order(self.client.as_ref(), &mut self.cart)
            .await;
        let order = result.map_err(|e| self.fail(e))?;

        self.catalog.invalidate(CacheKey::Orders).await;
        self.publish(ShopEvent::OrderPlaced {
            order_id: order.id.clone(),
        });
        self.publish(ShopEvent::CartChanged(self.cart.snapshot()));
        Ok(order)
    }

    // =========================================================================
    // Addresses and cards
    // =========================================================================

    /// Validate and save a new address.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad fields or a terminal error if the
    /// API rejected the address.
    #[instrument(skip_all)]
    pub async fn submit_address(&mut self, fields: &AddressFields) -> Result<AddressId> {
        let input = fields.validate().map_err(|e| self.fail(e))?;
        let id = self
            .client
            .create_address(&input)
            .await
            .map_err(|e| self.fail(e))?;
        info!(address_id = %id, "Address saved");
        self.catalog.invalidate(CacheKey::Addresses).await;
        Ok(id)
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns a terminal error if the API call failed.
    pub async fn delete_address(&mut self, id: &AddressId) -> Result<()> {
        self.client
            .delete_address(id)
            .await
            .map_err(|e| self.fail(e))?;
        self.catalog.invalidate(CacheKey::Addresses).await;
        Ok(())
    }

    /// Delete a saved card.
    ///
    /// # Errors
    ///
    /// Returns a terminal error if the API call failed.
    pub async fn delete_card(&mut self, id: &CardId) -> Result<()> {
        self.client
            .delete_card(id)
            .await
            .map_err(|e| self.fail(e))?;
        self.catalog.invalidate(CacheKey::Cards).await;
        Ok(())
    }

    /// Start out-of-band card entry. Refresh cards once the user is done.
    ///
    /// # Errors
    ///
    /// Returns a terminal error if the API call failed.
    pub async fn collect_card(&mut self) -> Result<CardCollect> {
        self.client.collect_card().await.map_err(|e| self.fail(e))
    }

    /// Drop a cached list so the next read refetches it.
    pub async fn refresh(&self, key: CacheKey) {
        self.catalog.invalidate(key).await;
    }

    // =========================================================================
    // Tree views
    // =========================================================================

    /// Catalog tree grouped into featured and original products.
    ///
    /// # Errors
    ///
    /// Returns a terminal error if the catalog could not be fetched.
    pub async fn product_tree(&self) -> Result<Vec<TreeNode>> {
        let products = self.catalog.products().await?;
        Ok(views::product_tree(&products))
    }

    /// Saved addresses, marking the selected one.
    ///
    /// # Errors
    ///
    /// Returns a terminal error if the list could not be fetched.
    pub async fn address_tree(&self) -> Result<Vec<TreeNode>> {
        let addresses = self.catalog.addresses().await?;
        Ok(views::address_tree(&addresses, self.cart.address_id()))
    }

    /// Saved cards, marking the selected one.
    ///
    /// # Errors
    ///
    /// Returns a terminal error if the list could not be fetched.
    pub async fn card_tree(&self) -> Result<Vec<TreeNode>> {
        let cards = self.catalog.cards().await?;
        Ok(views::card_tree(&cards, self.cart.card_id()))
    }

    /// Order history, newest first, with items labelled from the catalog.
    ///
    /// # Errors
    ///
    /// Returns a terminal error if either list could not be fetched.
    pub async fn order_tree(&self) -> Result<Vec<TreeNode>> {
        let (orders, products) = tokio::try_join!(self.catalog.orders(), self.catalog.products())?;
        Ok(views::order_tree(&orders, &products))
    }

    // =========================================================================
    // Form protocol
    // =========================================================================

    /// Handle one message from the checkout or address form.
    ///
    /// Failures are already published as events; the replies only carry what
    /// the forms need to re-render.
    pub async fn handle_message(&mut self, message: InboundMessage) -> Vec<Reply> {
        match message {
            InboundMessage::SubmitAddress(fields) => {
                let status = match self.submit_address(&fields).await {
                    Ok(_) => FormStatus::Success,
                    Err(_) => FormStatus::Error,
                };
                vec![Reply::Form(status)]
            }
            InboundMessage::CalculateTotal(request) => {
                if !self.matches_cart(&request) {
                    warn!("Checkout form cart differs from session cart, totaling session cart");
                }
                let total = self.calculate_total().await.unwrap_or_default();
                vec![Reply::Post(OutboundMessage::CalculateTotal(total))]
            }
            // A failed placement re-posts the kept total so the form can retry.
            InboundMessage::PlaceOrder => match self.place_order().await {
                Ok(_) => vec![Reply::Post(OutboundMessage::OrderPlaced)],
                Err(_) => vec![Reply::Post(OutboundMessage::CalculateTotal(
                    self.total().to_string(),
                ))],
            },
            InboundMessage::Close => {
                self.close_checkout();
                vec![Reply::Dispose]
            }
        }
    }

    fn matches_cart(&self, request: &TotalRequest) -> bool {
        let lines = self.cart.lines();
        request.products.len() == lines.len()
            && request
                .products
                .iter()
                .zip(lines)
                .all(|(r, l)| r.id == l.variant_id && r.quantity == l.quantity)
            && request.address.as_ref() == self.cart.address_id()
            && request.card.as_ref() == self.cart.card_id()
    }

    /// Log and publish a failure, returning it for the caller.
    fn fail(&self, error: impl Into<ShopError>) -> ShopError {
        let error = error.into();
        warn!(error = %error, "Shop command failed");
        self.publish(ShopEvent::Error {
            message: error.to_string(),
        });
        error
    }

    fn publish(&self, event: ShopEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
