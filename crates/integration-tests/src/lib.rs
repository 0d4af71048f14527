//! Integration tests for Terminal Shop.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory tests
//! cargo test -p terminal-shop-integration-tests
//!
//! # Live API tests (dev environment token required)
//! TERMINAL_BEARER_TOKEN=... cargo test -p terminal-shop-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Totaling and placing against [`FakeTerminal`]
//! - `catalog_cache` - Read-through caching and invalidation
//! - `session_messages` - Checkout form protocol end to end
//! - `live_api` - REST client against the dev API (ignored by default)

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use terminal_shop::terminal::{
    Address, AddressCreate, Card, CardCollect, CardExpiration, CartAmount, Order, OrderAmount,
    OrderItem, Product, ProductTags, ProductVariant, RemoteCart, RemoteCartItem,
};
use terminal_shop::{CommerceClient, ShopSession, TerminalError};
use terminal_shop_core::{AddressId, CardId, CartItemId, OrderId, ProductId, VariantId};

/// Flat shipping charged once an address is set, in cents.
pub const SHIPPING_CENTS: u64 = 800;

/// A commerce API call, as recorded by [`FakeTerminal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListProducts,
    ListAddresses,
    CreateAddress(String),
    DeleteAddress(AddressId),
    ListCards,
    CollectCard,
    DeleteCard(CardId),
    ClearCart,
    SetItem(VariantId, u32),
    SetAddress(Option<AddressId>),
    SetCard(Option<CardId>),
    GetCart,
    ConvertCart,
    ListOrders,
}

/// Call kind, for failure injection and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ListProducts,
    ListAddresses,
    CreateAddress,
    DeleteAddress,
    ListCards,
    CollectCard,
    DeleteCard,
    ClearCart,
    SetItem,
    SetAddress,
    SetCard,
    GetCart,
    ConvertCart,
    ListOrders,
}

impl Call {
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::ListProducts => Endpoint::ListProducts,
            Self::ListAddresses => Endpoint::ListAddresses,
            Self::CreateAddress(_) => Endpoint::CreateAddress,
            Self::DeleteAddress(_) => Endpoint::DeleteAddress,
            Self::ListCards => Endpoint::ListCards,
            Self::CollectCard => Endpoint::CollectCard,
            Self::DeleteCard(_) => Endpoint::DeleteCard,
            Self::ClearCart => Endpoint::ClearCart,
            Self::SetItem(..) => Endpoint::SetItem,
            Self::SetAddress(_) => Endpoint::SetAddress,
            Self::SetCard(_) => Endpoint::SetCard,
            Self::GetCart => Endpoint::GetCart,
            Self::ConvertCart => Endpoint::ConvertCart,
            Self::ListOrders => Endpoint::ListOrders,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    products: Vec<Product>,
    addresses: Vec<Address>,
    cards: Vec<Card>,
    orders: Vec<Order>,
    cart_items: Vec<(VariantId, u32)>,
    cart_address: Option<AddressId>,
    cart_card: Option<CardId>,
    calls: Vec<Call>,
    failing: Vec<Endpoint>,
    next_id: u32,
}

/// In-memory stand-in for the commerce API.
///
/// Behaves like the real API for the calls the shop makes: the cart is
/// server-side, setting a missing address or card is rejected, and totals
/// include shipping once an address is set.
#[derive(Debug, Clone, Default)]
pub struct FakeTerminal {
    state: Arc<Mutex<State>>,
}

impl FakeTerminal {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with [`sample_products`], one address, and one card.
    #[must_use]
    pub fn with_samples() -> Self {
        let fake = Self::new();
        {
            let mut state = fake.lock();
            state.products = sample_products();
            state.addresses = vec![sample_address()];
            state.cards = vec![sample_card()];
        }
        fake
    }

    /// A session backed by this fake.
    #[must_use]
    pub fn session(&self) -> ShopSession {
        ShopSession::new(Arc::new(self.clone()))
    }

    /// Make every call to `endpoint` fail until [`Self::recover`].
    pub fn fail_on(&self, endpoint: Endpoint) {
        self.lock().failing.push(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failing.retain(|e| *e != endpoint);
    }

    /// Calls made so far, in the order they started.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of calls made to `endpoint`.
    #[must_use]
    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint() == endpoint)
            .count()
    }

    /// Replace the catalog.
    pub fn set_products(&self, products: Vec<Product>) {
        self.lock().products = products;
    }

    /// Add an address behind the shop's back.
    pub fn push_address(&self, address: Address) {
        self.lock().addresses.push(address);
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    /// Server-side cart lines.
    #[must_use]
    pub fn cart_items(&self) -> Vec<(VariantId, u32)> {
        self.lock().cart_items.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and fail it if its endpoint is failing.
    fn record(&self, call: Call) -> Result<MutexGuard<'_, State>, TerminalError> {
        let mut state = self.lock();
        let endpoint = call.endpoint();
        state.calls.push(call);
        if state.failing.contains(&endpoint) {
            return Err(TerminalError::Api {
                status: 400,
                message: format!("{endpoint:?} rejected"),
            });
        }
        Ok(state)
    }
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    fn price(&self, variant_id: &VariantId) -> Option<u64> {
        self.products
            .iter()
            .find_map(|p| p.variant(variant_id))
            .map(|v| v.price)
    }

    fn remote_cart(&self) -> RemoteCart {
        let items: Vec<RemoteCartItem> = self
            .cart_items
            .iter()
            .enumerate()
            .map(|(i, (variant_id, quantity))| RemoteCartItem {
                id: CartItemId::new(format!("cri_{i}")),
                product_variant_id: variant_id.clone(),
                quantity: *quantity,
                subtotal: self.price(variant_id).unwrap_or(0) * u64::from(*quantity),
            })
            .collect();
        let subtotal: u64 = items.iter().map(|i| i.subtotal).sum();
        let shipping = self.cart_address.as_ref().map(|_| SHIPPING_CENTS);
        let total = match (&shipping, &self.cart_card) {
            (Some(shipping), Some(_)) => Some(subtotal + shipping),
            _ => None,
        };

        RemoteCart {
            items,
            amount: CartAmount {
                subtotal,
                shipping,
                total,
            },
            address_id: self.cart_address.clone(),
            card_id: self.cart_card.clone(),
            shipping: None,
        }
    }
}

fn bad_request(message: &str) -> TerminalError {
    TerminalError::Api {
        status: 400,
        message: message.to_string(),
    }
}

#[async_trait]
impl CommerceClient for FakeTerminal {
    async fn list_products(&self) -> Result<Vec<Product>, TerminalError> {
        Ok(self.record(Call::ListProducts)?.products.clone())
    }

    async fn list_addresses(&self) -> Result<Vec<Address>, TerminalError> {
        Ok(self.record(Call::ListAddresses)?.addresses.clone())
    }

    async fn create_address(&self, input: &AddressCreate) -> Result<AddressId, TerminalError> {
        let mut state = self.record(Call::CreateAddress(input.street1.clone()))?;
        let id = AddressId::new(state.next_id("shp"));
        state.addresses.push(Address {
            id: id.clone(),
            name: input.name.clone(),
            street1: input.street1.clone(),
            street2: input.street2.clone(),
            city: input.city.clone(),
            province: input.province.clone(),
            country: input.country.to_string(),
            zip: input.zip.clone(),
            phone: input.phone.clone(),
        });
        Ok(id)
    }

    async fn delete_address(&self, id: &AddressId) -> Result<(), TerminalError> {
        let mut state = self.record(Call::DeleteAddress(id.clone()))?;
        let before = state.addresses.len();
        state.addresses.retain(|a| &a.id != id);
        if state.addresses.len() == before {
            return Err(TerminalError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_cards(&self) -> Result<Vec<Card>, TerminalError> {
        Ok(self.record(Call::ListCards)?.cards.clone())
    }

    async fn collect_card(&self) -> Result<CardCollect, TerminalError> {
        drop(self.record(Call::CollectCard)?);
        Ok(CardCollect {
            url: "https://pay.example.test/collect/abc".to_string(),
        })
    }

    async fn delete_card(&self, id: &CardId) -> Result<(), TerminalError> {
        let mut state = self.record(Call::DeleteCard(id.clone()))?;
        let before = state.cards.len();
        state.cards.retain(|c| &c.id != id);
        if state.cards.len() == before {
            return Err(TerminalError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), TerminalError> {
        let mut state = self.record(Call::ClearCart)?;
        state.cart_items.clear();
        state.cart_address = None;
        state.cart_card = None;
        Ok(())
    }

    async fn set_cart_item(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<RemoteCart, TerminalError> {
        let mut state = self.record(Call::SetItem(variant_id.clone(), quantity))?;
        if state.price(variant_id).is_none() {
            return Err(TerminalError::NotFound(variant_id.to_string()));
        }
        match state.cart_items.iter_mut().find(|(id, _)| id == variant_id) {
            Some(line) => line.1 = quantity,
            None => state.cart_items.push((variant_id.clone(), quantity)),
        }
        Ok(state.remote_cart())
    }

    async fn set_cart_address(
        &self,
        address_id: Option<&AddressId>,
    ) -> Result<RemoteCart, TerminalError> {
        let mut state = self.record(Call::SetAddress(address_id.cloned()))?;
        let Some(id) = address_id else {
            return Err(bad_request("addressID is required"));
        };
        if !state.addresses.iter().any(|a| &a.id == id) {
            return Err(TerminalError::NotFound(id.to_string()));
        }
        state.cart_address = Some(id.clone());
        Ok(state.remote_cart())
    }

    async fn set_cart_card(&self, card_id: Option<&CardId>) -> Result<RemoteCart, TerminalError> {
        let mut state = self.record(Call::SetCard(card_id.cloned()))?;
        let Some(id) = card_id else {
            return Err(bad_request("cardID is required"));
        };
        if !state.cards.iter().any(|c| &c.id == id) {
            return Err(TerminalError::NotFound(id.to_string()));
        }
        state.cart_card = Some(id.clone());
        Ok(state.remote_cart())
    }

    async fn get_cart(&self) -> Result<RemoteCart, TerminalError> {
        Ok(self.record(Call::GetCart)?.remote_cart())
    }

    async fn convert_cart(&self) -> Result<Order, TerminalError> {
        let mut state = self.record(Call::ConvertCart)?;
        if state.cart_items.is_empty() {
            return Err(bad_request("cart is empty"));
        }
        if state.cart_address.is_none() || state.cart_card.is_none() {
            return Err(bad_request("cart is missing an address or card"));
        }

        let cart = state.remote_cart();
        let id = OrderId::new(state.next_id("ord"));
        let order = Order {
            id,
            index: u32::try_from(state.orders.len()).ok(),
            amount: OrderAmount {
                subtotal: cart.amount.subtotal,
                shipping: cart.amount.shipping.unwrap_or(0),
            },
            items: cart
                .items
                .iter()
                .map(|item| OrderItem {
                    id: item.id.to_string(),
                    product_variant_id: Some(item.product_variant_id.clone()),
                    description: None,
                    quantity: item.quantity,
                    amount: item.subtotal,
                })
                .collect(),
            shipping: Default::default(),
            tracking: Default::default(),
            created: None,
        };

        state.orders.insert(0, order.clone());
        state.cart_items.clear();
        state.cart_address = None;
        state.cart_card = None;
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, TerminalError> {
        Ok(self.record(Call::ListOrders)?.orders.clone())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Two products: featured "Cron" with one variant, "Flow" with two.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            id: ProductId::new("prd_cron"),
            name: "Cron".to_string(),
            description: "Seasonal single origin".to_string(),
            variants: vec![ProductVariant {
                id: VariantId::new("var_cron_12oz"),
                name: "12oz Whole Beans".to_string(),
                price: 2500,
            }],
            order: Some(1),
            tags: ProductTags {
                color: Some("#D4AF37".to_string()),
                featured: Some(true),
            },
        },
        Product {
            id: ProductId::new("prd_flow"),
            name: "Flow".to_string(),
            description: "Medium roast blend".to_string(),
            variants: vec![
                ProductVariant {
                    id: VariantId::new("var_flow_12oz"),
                    name: "12oz Whole Beans".to_string(),
                    price: 2200,
                },
                ProductVariant {
                    id: VariantId::new("var_flow_2lb"),
                    name: "2lb Whole Beans".to_string(),
                    price: 6000,
                },
            ],
            order: Some(2),
            tags: ProductTags::default(),
        },
    ]
}

#[must_use]
pub fn sample_address() -> Address {
    Address {
        id: AddressId::new("shp_home"),
        name: "Ada Lovelace".to_string(),
        street1: "12 Analytical Way".to_string(),
        street2: None,
        city: "Austin".to_string(),
        province: Some("TX".to_string()),
        country: "US".to_string(),
        zip: "78701".to_string(),
        phone: None,
    }
}

#[must_use]
pub fn sample_card() -> Card {
    Card {
        id: CardId::new("crd_visa"),
        brand: "visa".to_string(),
        last4: "4242".to_string(),
        expiration: CardExpiration {
            month: 3,
            year: 2030,
        },
    }
}
