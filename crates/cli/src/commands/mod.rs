//! Subcommand implementations and shared output helpers.

pub mod addresses;
pub mod bridge;
pub mod cards;
pub mod checkout;

use terminal_shop::{AddressRef, CardRef, ShopError, ShopSession, TreeNode};
use terminal_shop_core::{AddressId, CardId, VariantId};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `--item` value that is not `VARIANT` or `VARIANT:QTY`.
    #[error("Invalid item {0:?}: expected VARIANT or VARIANT:QTY with QTY >= 1")]
    InvalidItem(String),
}

impl From<terminal_shop::TerminalError> for CliError {
    fn from(e: terminal_shop::TerminalError) -> Self {
        Self::Shop(e.into())
    }
}

/// Print tree nodes indented, or as pretty JSON.
#[allow(clippy::print_stdout)]
pub fn print_tree(nodes: &[TreeNode], json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(nodes)?);
        return Ok(());
    }
    if nodes.is_empty() {
        println!("(none)");
    }
    for line in tree_lines(nodes, 0) {
        println!("{line}");
    }
    Ok(())
}

fn tree_lines(nodes: &[TreeNode], depth: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for node in nodes {
        let mut line = format!(
            "{}{}{}",
            "  ".repeat(depth),
            if node.selected { "* " } else { "" },
            node.label
        );
        if let Some(description) = &node.description {
            line.push_str("  ");
            line.push_str(description);
        }
        if let (true, Some(id)) = (node.children.is_empty(), &node.id) {
            line.push_str("  [");
            line.push_str(id);
            line.push(']');
        }
        lines.push(line);
        lines.extend(tree_lines(&node.children, depth + 1));
    }
    lines
}

/// Parse `VARIANT` or `VARIANT:QTY`.
pub fn parse_item(value: &str) -> Result<(VariantId, u32), CliError> {
    let (id, quantity) = match value.split_once(':') {
        Some((id, qty)) => (
            id,
            qty.parse::<u32>()
                .map_err(|_| CliError::InvalidItem(value.to_string()))?,
        ),
        None => (value, 1),
    };
    if id.trim().is_empty() || quantity == 0 {
        return Err(CliError::InvalidItem(value.to_string()));
    }
    Ok((VariantId::new(id.trim()), quantity))
}

/// Reference to a saved address, labelled from the address list.
///
/// An ID missing from the list is still selected; the API rejects it at
/// totaling time.
pub async fn address_ref(session: &ShopSession, id: AddressId) -> Result<AddressRef, CliError> {
    let addresses = session.catalog().addresses().await?;
    Ok(addresses
        .iter()
        .find(|a| a.id == id)
        .map_or_else(|| AddressRef::new(id.clone(), id.as_str()), AddressRef::from))
}

/// Reference to a saved card, labelled from the card list.
pub async fn card_ref(session: &ShopSession, id: CardId) -> Result<CardRef, CliError> {
    let cards = session.catalog().cards().await?;
    Ok(cards
        .iter()
        .find(|c| c.id == id)
        .map_or_else(|| CardRef::new(id.clone(), id.as_str()), CardRef::from))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("var_1").unwrap(), (VariantId::new("var_1"), 1));
        assert_eq!(parse_item("var_1:3").unwrap(), (VariantId::new("var_1"), 3));
        assert!(matches!(parse_item("var_1:0"), Err(CliError::InvalidItem(_))));
        assert!(matches!(parse_item("var_1:x"), Err(CliError::InvalidItem(_))));
        assert!(matches!(parse_item(":2"), Err(CliError::InvalidItem(_))));
    }

    #[test]
    fn test_tree_lines_indent_and_mark_selection() {
        let nodes = vec![TreeNode {
            label: "Featured".to_string(),
            children: vec![TreeNode {
                id: Some("crd_1".to_string()),
                label: "VISA ending in 4242".to_string(),
                description: Some("03/2027".to_string()),
                selected: true,
                children: Vec::new(),
            }],
            ..TreeNode::default()
        }];

        assert_eq!(
            tree_lines(&nodes, 0),
            ["Featured", "  * VISA ending in 4242  03/2027  [crd_1]"]
        );
    }
}
