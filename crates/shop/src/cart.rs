//! The in-memory shopping cart for the active session.
//!
//! [`Cart`] is plain data with pure transition methods. It never talks to the
//! commerce API and never triggers renders; callers read a [`CartSnapshot`]
//! after each mutation.
//!
//! Invariants:
//! - at most one [`CartLine`] per variant ID, kept in insertion order
//! - every line's quantity is at least 1; a decrement reaching 0 removes it
//! - selections stay `None` until the first select call

use serde::{Deserialize, Serialize};
use terminal_shop_core::{AddressId, CardId, VariantId};

use crate::terminal::types::{Address, Card};

/// One variant and its requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Variant ID (line identity).
    #[serde(rename = "id")]
    pub variant_id: VariantId,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Quantity, always >= 1.
    pub quantity: u32,
}

/// Pointer to the selected shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRef {
    pub id: AddressId,
    pub title: String,
}

impl AddressRef {
    #[must_use]
    pub fn new(id: AddressId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

impl From<&Address> for AddressRef {
    fn from(address: &Address) -> Self {
        Self::new(
            address.id.clone(),
            format!("{}, {}", address.street1, address.city),
        )
    }
}

/// Pointer to the selected payment card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRef {
    pub id: CardId,
    /// Display summary such as "VISA ending in 4242".
    #[serde(rename = "number")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

impl CardRef {
    #[must_use]
    pub fn new(id: CardId, summary: impl Into<String>) -> Self {
        Self {
            id,
            summary: summary.into(),
            expiration: None,
        }
    }
}

impl From<&Card> for CardRef {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            summary: format!("{} ending in {}", card.brand.to_uppercase(), card.last4),
            expiration: Some(format!(
                "{:02}/{}",
                card.expiration.month, card.expiration.year
            )),
        }
    }
}

/// Last-selected address and card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSelection {
    pub selected_address: Option<AddressRef>,
    pub selected_card: Option<CardRef>,
}

/// Immutable read of the cart, shaped for the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub products: Vec<CartLine>,
    #[serde(flatten)]
    pub selection: CartSelection,
}

impl CartSnapshot {
    /// Whether the snapshot has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// The session's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    selection: CartSelection,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a variant.
    ///
    /// Increments the existing line, or appends a new line with quantity 1.
    /// Title and description are only used when a new line is created.
    pub fn add_item(
        &mut self,
        variant_id: &VariantId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) {
        if let Some(line) = self.line_mut(variant_id) {
            line.quantity = line.quantity.saturating_add(1);
            return;
        }
        self.lines.push(CartLine {
            variant_id: variant_id.clone(),
            title: title.into(),
            description: description.into(),
            quantity: 1,
        });
    }

    /// Remove one unit of a variant.
    ///
    /// Returns `false` (and changes nothing) when the variant is not in the
    /// cart. The line is deleted once its quantity would reach 0.
    pub fn remove_item(&mut self, variant_id: &VariantId) -> bool {
        let Some(index) = self.lines.iter().position(|l| &l.variant_id == variant_id) else {
            return false;
        };
        match self.lines.get_mut(index) {
            Some(line) if line.quantity > 1 => line.quantity -= 1,
            _ => {
                self.lines.remove(index);
            }
        }
        true
    }

    /// Select the shipping address. Last write wins.
    pub fn select_address(&mut self, address: AddressRef) {
        self.selection.selected_address = Some(address);
    }

    /// Select the payment card. Last write wins.
    pub fn select_card(&mut self, card: CardRef) {
        self.selection.selected_card = Some(card);
    }

    /// Clear every line and both selections.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.selection = CartSelection::default();
    }

    /// Owned copy of the current lines and selections.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            products: self.lines.clone(),
            selection: self.selection.clone(),
        }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Current selections.
    #[must_use]
    pub const fn selection(&self) -> &CartSelection {
        &self.selection
    }

    /// ID of the selected address, if any.
    #[must_use]
    pub fn address_id(&self) -> Option<&AddressId> {
        self.selection.selected_address.as_ref().map(|a| &a.id)
    }

    /// ID of the selected card, if any.
    #[must_use]
    pub fn card_id(&self) -> Option<&CardId> {
        self.selection.selected_card.as_ref().map(|c| &c.id)
    }

    /// Quantity of a variant, 0 when absent.
    #[must_use]
    pub fn quantity(&self, variant_id: &VariantId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.variant_id == variant_id)
            .map_or(0, |l| l.quantity)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, variant_id: &VariantId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.variant_id == variant_id)
    }
}
