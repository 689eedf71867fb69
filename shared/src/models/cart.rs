//! Cart line item types

use serde::{Deserialize, Serialize};

use super::product::Product;
use crate::util::line_id;

/// One line in the cart.
///
/// The unit price is computed once when the line is created (size base
/// price plus the flat per-extra surcharge) and is only recomputed when
/// a product-updated push arrives with a new price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Locally generated opaque id, cart-scoped only
    pub line_id: String,
    /// Product reference id
    pub product_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Chosen size (key into the product's price table)
    pub size: String,
    /// Unit price in naira
    pub price: f64,
    /// Selected extra names
    #[serde(default)]
    pub extras: Vec<String>,
    /// Free-text kitchen note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Always >= 1; a decrement at 1 removes the line instead
    pub quantity: i32,
    pub category: String,
}

/// A confirmed product configuration, ready to become a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSelection {
    pub size: String,
    #[serde(default)]
    pub extras: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub quantity: i32,
}

impl CartItem {
    /// Build a cart line from a product and a confirmed selection.
    ///
    /// Returns `None` when the selected size is not in the product's
    /// price table.
    pub fn from_selection(product: &Product, selection: ItemSelection) -> Option<Self> {
        let price = product.unit_price(&selection.size, selection.extras.len())?;
        Some(Self {
            line_id: line_id(),
            product_id: product.id.clone().unwrap_or_default(),
            name: product.name.clone(),
            image: product.image.clone(),
            size: selection.size,
            price,
            extras: selection.extras,
            note: selection.note,
            quantity: selection.quantity.max(1),
            category: product.category.clone(),
        })
    }

    /// Line total (unit price x quantity).
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::{SizePrice, EXTRA_SURCHARGE};

    fn product() -> Product {
        Product {
            id: Some("prod-7".to_string()),
            name: "Suya Platter".to_string(),
            description: None,
            image: None,
            category: "Grill".to_string(),
            prices: vec![SizePrice {
                size: "REGULAR".to_string(),
                price: 3000.0,
            }],
            extras: vec!["Onions".to_string()],
            available: true,
        }
    }

    #[test]
    fn test_from_selection_computes_unit_price() {
        let item = CartItem::from_selection(
            &product(),
            ItemSelection {
                size: "REGULAR".to_string(),
                extras: vec!["Onions".to_string()],
                note: None,
                quantity: 2,
            },
        )
        .unwrap();

        assert_eq!(item.price, 3000.0 + EXTRA_SURCHARGE);
        assert_eq!(item.line_total(), 2.0 * (3000.0 + EXTRA_SURCHARGE));
    }

    #[test]
    fn test_from_selection_rejects_unknown_size() {
        let selection = ItemSelection {
            size: "FAMILY".to_string(),
            extras: vec![],
            note: None,
            quantity: 1,
        };
        assert!(CartItem::from_selection(&product(), selection).is_none());
    }

    #[test]
    fn test_quantity_floor_on_creation() {
        let item = CartItem::from_selection(
            &product(),
            ItemSelection {
                size: "REGULAR".to_string(),
                extras: vec![],
                note: None,
                quantity: 0,
            },
        )
        .unwrap();
        assert_eq!(item.quantity, 1);
    }
}
