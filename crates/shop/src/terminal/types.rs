//! Domain types for the Terminal commerce API.
//!
//! These mirror the JSON resources returned by the REST API. Amounts are
//! integers in cents; use [`Price::from_cents`] for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use terminal_shop_core::{
    AddressId, CardId, CartItemId, CountryCode, OrderId, Price, ProductId, VariantId,
};

// =============================================================================
// Envelope
// =============================================================================

/// Every API response wraps its result in a `data` field.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

// =============================================================================
// Product Types
// =============================================================================

/// A purchasable SKU of a product (e.g., one size or grind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID.
    pub id: VariantId,
    /// Variant name (e.g., "12oz Whole Beans").
    pub name: String,
    /// Price in cents.
    pub price: u64,
}

impl ProductVariant {
    /// Variant price as a formatted amount.
    #[must_use]
    pub fn display_price(&self) -> String {
        Price::from_cents(self.price).display()
    }
}

/// Merchandising tags attached to a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTags {
    /// Accent color (hex, e.g. `#D4AF37`).
    #[serde(default)]
    pub color: Option<String>,
    /// Whether the product is featured in the catalog.
    #[serde(default)]
    pub featured: Option<bool>,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Plain text description.
    pub description: String,
    /// Product variants.
    pub variants: Vec<ProductVariant>,
    /// Display order within the catalog.
    #[serde(default)]
    pub order: Option<i64>,
    /// Merchandising tags.
    #[serde(default)]
    pub tags: ProductTags,
}

impl Product {
    /// Whether the product carries the featured tag.
    #[must_use]
    pub fn is_featured(&self) -> bool {
        self.tags.featured.unwrap_or(false)
    }

    /// Find one of this product's variants by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }
}

// =============================================================================
// Address Types
// =============================================================================

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address ID.
    pub id: AddressId,
    /// Recipient name.
    pub name: String,
    /// Street line 1.
    pub street1: String,
    /// Street line 2.
    #[serde(default)]
    pub street2: Option<String>,
    /// City.
    pub city: String,
    /// Province or state.
    #[serde(default)]
    pub province: Option<String>,
    /// Country code.
    pub country: String,
    /// Postal code.
    pub zip: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Input for creating an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressCreate {
    pub name: String,
    pub street1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    pub country: CountryCode,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// =============================================================================
// Card Types
// =============================================================================

/// Card expiration date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExpiration {
    pub month: u32,
    pub year: u32,
}

/// A saved payment card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card ID.
    pub id: CardId,
    /// Card brand (e.g., "visa").
    pub brand: String,
    /// Last four digits.
    pub last4: String,
    /// Expiration date.
    pub expiration: CardExpiration,
}

/// Out-of-band card entry link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCollect {
    /// URL where the user enters card details.
    pub url: String,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Cost summary of the remote cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartAmount {
    /// Sum of item subtotals.
    pub subtotal: u64,
    /// Shipping cost, once an address is set.
    #[serde(default)]
    pub shipping: Option<u64>,
    /// Grand total, once the cart is complete.
    #[serde(default)]
    pub total: Option<u64>,
}

impl CartAmount {
    /// The amount the customer will be charged.
    ///
    /// Prefers the server-computed total; falls back to subtotal plus any
    /// shipping when the total is absent.
    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.total
            .unwrap_or_else(|| self.subtotal.saturating_add(self.shipping.unwrap_or(0)))
    }
}

/// A line item in the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartItem {
    /// Cart item ID.
    pub id: CartItemId,
    /// Variant being purchased.
    #[serde(rename = "productVariantID")]
    pub product_variant_id: VariantId,
    /// Quantity.
    pub quantity: u32,
    /// Line subtotal in cents.
    pub subtotal: u64,
}

/// Shipping option chosen for the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartShipping {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
}

/// The server-side cart, including computed totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCart {
    /// Line items.
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    /// Cost summary.
    pub amount: CartAmount,
    /// Selected shipping address.
    #[serde(rename = "addressID", default)]
    pub address_id: Option<AddressId>,
    /// Selected card.
    #[serde(rename = "cardID", default)]
    pub card_id: Option<CardId>,
    /// Shipping details.
    #[serde(default)]
    pub shipping: Option<CartShipping>,
}

/// Input for upserting a cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemInput<'a> {
    #[serde(rename = "productVariantID")]
    pub product_variant_id: &'a VariantId,
    pub quantity: u32,
}

/// Input for setting the cart address. An absent ID is sent as an empty body.
#[derive(Debug, Clone, Serialize)]
pub struct CartAddressInput<'a> {
    #[serde(rename = "addressID", skip_serializing_if = "Option::is_none")]
    pub address_id: Option<&'a AddressId>,
}

/// Input for setting the cart card. An absent ID is sent as an empty body.
#[derive(Debug, Clone, Serialize)]
pub struct CartCardInput<'a> {
    #[serde(rename = "cardID", skip_serializing_if = "Option::is_none")]
    pub card_id: Option<&'a CardId>,
}

// =============================================================================
// Order Types
// =============================================================================

/// Amounts charged for an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmount {
    pub subtotal: u64,
    pub shipping: u64,
}

impl OrderAmount {
    /// Subtotal plus shipping, in cents.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.subtotal + self.shipping
    }
}

/// A line item of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Order item ID.
    pub id: String,
    /// Variant purchased, if it still maps to a catalog variant.
    #[serde(rename = "productVariantID", default)]
    pub product_variant_id: Option<VariantId>,
    /// Free-form description for items outside the catalog.
    #[serde(default)]
    pub description: Option<String>,
    /// Quantity.
    pub quantity: u32,
    /// Line amount in cents.
    pub amount: u64,
}

/// Shipping destination snapshot stored on an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShipping {
    pub name: String,
    pub street1: String,
    #[serde(default)]
    pub street2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub province: Option<String>,
    pub country: String,
    pub zip: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Shipment tracking details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTracking {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Sequence number of the order for this account.
    #[serde(default)]
    pub index: Option<u32>,
    /// Amounts charged.
    pub amount: OrderAmount,
    /// Items purchased.
    pub items: Vec<OrderItem>,
    /// Destination.
    #[serde(default)]
    pub shipping: OrderShipping,
    /// Tracking details.
    #[serde(default)]
    pub tracking: OrderTracking,
    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}
