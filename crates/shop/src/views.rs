//! Host-agnostic tree view models.
//!
//! Each builder turns an API list into labelled nodes a host can render as a
//! tree; selection markers come from the session cart.

use serde::Serialize;
use terminal_shop_core::{AddressId, CardId, Price};

use crate::cart::{AddressRef, CardRef};
use crate::catalog::find_variant_in;
use crate::terminal::{Address, Card, Order, OrderItem, Product};

/// One row of a tree view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Resource ID, when the row maps to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marks the currently selected address or card.
    pub selected: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// =============================================================================
// Products
// =============================================================================

/// Products grouped into "Featured" and "Originals", each in catalog order.
///
/// Empty groups are omitted.
#[must_use]
pub fn product_tree(products: &[Product]) -> Vec<TreeNode> {
    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by_key(|p| p.order.unwrap_or(i64::MAX));

    let (featured, originals): (Vec<&Product>, Vec<&Product>) =
        sorted.into_iter().partition(|p| p.is_featured());

    [("Featured", featured), ("Originals", originals)]
        .into_iter()
        .filter(|(_, group)| !group.is_empty())
        .map(|(label, group)| TreeNode {
            children: group.into_iter().map(product_node).collect(),
            ..TreeNode::new(label)
        })
        .collect()
}

fn product_node(product: &Product) -> TreeNode {
    let mut node = TreeNode::new(&product.name).with_id(product.id.as_str());
    if let Some(range) = price_range(product) {
        node = node.with_description(range);
    }
    node.children = product
        .variants
        .iter()
        .map(|variant| {
            TreeNode::new(&variant.name)
                .with_id(variant.id.as_str())
                .with_description(variant.display_price())
        })
        .collect();
    node
}

/// `"$22.00"` for one price, `"$22.00 - $40.00"` for several.
fn price_range(product: &Product) -> Option<String> {
    let min = product.variants.iter().map(|v| v.price).min()?;
    let max = product.variants.iter().map(|v| v.price).max()?;
    if min == max {
        Some(Price::from_cents(min).display())
    } else {
        Some(format!(
            "{} - {}",
            Price::from_cents(min).display(),
            Price::from_cents(max).display()
        ))
    }
}

// =============================================================================
// Addresses and cards
// =============================================================================

/// Saved addresses labelled `street1, city`.
#[must_use]
pub fn address_tree(addresses: &[Address], selected: Option<&AddressId>) -> Vec<TreeNode> {
    addresses
        .iter()
        .map(|address| {
            let region = address
                .province
                .as_deref()
                .filter(|p| !p.is_empty())
                .map_or_else(
                    || address.country.clone(),
                    |p| format!("{p}, {}", address.country),
                );
            TreeNode {
                selected: selected == Some(&address.id),
                ..TreeNode::new(AddressRef::from(address).title)
                    .with_id(address.id.as_str())
                    .with_description(region)
            }
        })
        .collect()
}

/// Saved cards labelled `BRAND ending in 1234`.
#[must_use]
pub fn card_tree(cards: &[Card], selected: Option<&CardId>) -> Vec<TreeNode> {
    cards
        .iter()
        .map(|card| {
            let card_ref = CardRef::from(card);
            let mut node = TreeNode::new(card_ref.summary).with_id(card.id.as_str());
            if let Some(expiration) = card_ref.expiration {
                node = node.with_description(expiration);
            }
            node.selected = selected == Some(&card.id);
            node
        })
        .collect()
}

// =============================================================================
// Order history
// =============================================================================

/// Orders as given (newest first), numbered down from the newest.
///
/// Items are labelled `Product (Variant)` when the variant is still in
/// `products`, otherwise by their own description.
#[must_use]
pub fn order_tree(orders: &[Order], products: &[Product]) -> Vec<TreeNode> {
    let count = orders.len();
    orders
        .iter()
        .enumerate()
        .map(|(position, order)| TreeNode {
            children: order
                .items
                .iter()
                .map(|item| order_item_node(item, products))
                .collect(),
            ..TreeNode::new(format!(
                "Order #{} - {}",
                count - position,
                Price::from_cents(order.amount.total()).display()
            ))
            .with_id(order.id.as_str())
        })
        .collect()
}

fn order_item_node(item: &OrderItem, products: &[Product]) -> TreeNode {
    let label = item
        .product_variant_id
        .as_ref()
        .and_then(|id| find_variant_in(products, id))
        .map(|found| format!("{} ({})", found.product.name, found.variant.name))
        .or_else(|| item.description.clone())
        .unwrap_or_else(|| "Unknown item".to_string());
    TreeNode::new(label)
        .with_id(item.id.as_str())
        .with_description(format!("x{}", item.quantity))
}

#[cfg(test)]
mod tests {
    use terminal_shop_core::{OrderId, ProductId, VariantId};

    use super::*;
    use crate::terminal::{CardExpiration, OrderAmount, ProductTags, ProductVariant};

    fn product(id: &str, featured: bool, order: i64, prices: &[(&str, u64)]) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_string(),
            description: String::new(),
            variants: prices
                .iter()
                .map(|(v, price)| ProductVariant {
                    id: VariantId::new(*v),
                    name: format!("{v} 12oz"),
                    price: *price,
                })
                .collect(),
            order: Some(order),
            tags: ProductTags {
                color: None,
                featured: Some(featured),
            },
        }
    }

    fn address(id: &str, province: Option<&str>) -> Address {
        Address {
            id: AddressId::new(id),
            name: "Ada".to_string(),
            street1: "1 Main St".to_string(),
            street2: None,
            city: "Austin".to_string(),
            province: province.map(str::to_string),
            country: "US".to_string(),
            zip: "78701".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_product_tree_groups_and_orders() {
        let products = vec![
            product("flow", false, 2, &[("v3", 2200)]),
            product("cron", true, 1, &[("v1", 2200), ("v2", 4000)]),
            product("segfault", false, 1, &[("v4", 2500)]),
        ];

        let tree = product_tree(&products);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].label, "Featured");
        assert_eq!(tree[0].children[0].label, "cron");
        assert_eq!(
            tree[0].children[0].description.as_deref(),
            Some("$22.00 - $40.00")
        );
        assert_eq!(tree[0].children[0].children[1].description.as_deref(), Some("$40.00"));

        assert_eq!(tree[1].label, "Originals");
        let names: Vec<_> = tree[1].children.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(names, ["segfault", "flow"]);
        assert_eq!(tree[1].children[1].description.as_deref(), Some("$22.00"));
    }

    #[test]
    fn test_product_tree_omits_empty_group() {
        let tree = product_tree(&[product("flow", false, 1, &[("v3", 2200)])]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].label, "Originals");
    }

    #[test]
    fn test_address_tree_labels_and_selection() {
        let addresses = vec![address("shp_1", Some("TX")), address("shp_2", None)];
        let tree = address_tree(&addresses, Some(&AddressId::new("shp_2")));

        assert_eq!(tree[0].label, "1 Main St, Austin");
        assert_eq!(tree[0].description.as_deref(), Some("TX, US"));
        assert!(!tree[0].selected);
        assert_eq!(tree[1].description.as_deref(), Some("US"));
        assert!(tree[1].selected);
    }

    #[test]
    fn test_card_tree_labels() {
        let cards = vec![Card {
            id: CardId::new("crd_1"),
            brand: "visa".to_string(),
            last4: "4242".to_string(),
            expiration: CardExpiration {
                month: 3,
                year: 2027,
            },
        }];

        let tree = card_tree(&cards, None);
        assert_eq!(tree[0].label, "VISA ending in 4242");
        assert_eq!(tree[0].description.as_deref(), Some("03/2027"));
        assert!(!tree[0].selected);
    }

    #[test]
    fn test_order_tree_numbers_down_and_labels_items() {
        let products = vec![product("cron", true, 1, &[("v1", 2200)])];
        let order = |id: &str, items: Vec<OrderItem>| Order {
            id: OrderId::new(id),
            index: None,
            amount: OrderAmount {
                subtotal: 2200,
                shipping: 800,
            },
            items,
            shipping: Default::default(),
            tracking: Default::default(),
            created: None,
        };
        let orders = vec![
            order(
                "ord_2",
                vec![OrderItem {
                    id: "itm_1".to_string(),
                    product_variant_id: Some(VariantId::new("v1")),
                    description: None,
                    quantity: 2,
                    amount: 4400,
                }],
            ),
            order(
                "ord_1",
                vec![OrderItem {
                    id: "itm_2".to_string(),
                    product_variant_id: None,
                    description: Some("Gift card".to_string()),
                    quantity: 1,
                    amount: 2200,
                }],
            ),
        ];

        let tree = order_tree(&orders, &products);

        assert_eq!(tree[0].label, "Order #2 - $30.00");
        assert_eq!(tree[0].children[0].label, "cron (v1 12oz)");
        assert_eq!(tree[0].children[0].description.as_deref(), Some("x2"));
        assert_eq!(tree[1].label, "Order #1 - $30.00");
        assert_eq!(tree[1].children[0].label, "Gift card");
    }
}
