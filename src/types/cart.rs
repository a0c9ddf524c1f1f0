use serde::{Deserialize, Serialize};

/// One variant's presence in the cart, as rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub variant_id: String,
    pub quantity: u32,
    /// Display string; compared by substring, never parsed.
    pub item_price: String,
}

/// Rendered details of a single line, read fresh from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDetails {
    pub quantity: u32,
    pub item_price: String,
}

/// Predicate input for [`crate::CartView::check_for_item_in_cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemQuery {
    pub variant_id: String,
    pub price: String,
    pub quantity: u32,
}

impl CartItemQuery {
    /// Query for an item that was just added; `None` when the page rendered no price.
    pub fn for_added(item: &AddToCartResult, quantity: u32) -> Option<Self> {
        let price = item.price.as_deref().map(str::trim).filter(|p| !p.is_empty())?;
        Some(Self {
            variant_id: item.variant_id.clone(),
            price: price.to_string(),
            quantity,
        })
    }

    /// An empty expected price never matches.
    pub fn matches(&self, line: &CartLine) -> bool {
        !self.price.trim().is_empty()
            && line.variant_id == self.variant_id
            && line.quantity == self.quantity
            && line.item_price.contains(&self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityChange {
    pub variant_id: String,
    pub quantity: u32,
}

/// What the product page reports after an add-to-cart click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartResult {
    /// `variant` query parameter of the page URL; empty when absent.
    pub variant_id: String,
    pub price: Option<String>,
    pub name: String,
}

/// Parse a rendered quantity field; missing or malformed values read as 0.
pub(crate) fn parse_quantity(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}
