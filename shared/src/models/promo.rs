//! Promo codes and their application to a cart

use serde::{Deserialize, Serialize};

use super::cart::CartItem;

/// Promo code entity (admin CRUD surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: Option<String>,
    pub code: String,
    /// Discount percent (0-100)
    pub percent: f64,
    /// Categories the code restricts to; empty = all categories
    #[serde(default)]
    pub categories: Vec<String>,
    pub active: bool,
    /// Unix millis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Result of validating a promo code against the current cart.
///
/// Never persisted across reload; a promo must be re-validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPromo {
    pub code: String,
    /// Discount percent (0-100)
    pub percent: f64,
    /// Categories the discount applies to; empty = all
    #[serde(default)]
    pub categories: Vec<String>,
}

impl AppliedPromo {
    /// Whether the discount covers this item's category.
    pub fn covers(&self, item: &CartItem) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == &item.category)
    }

    /// Discount amount over the given items, in naira.
    pub fn discount_on(&self, items: &[CartItem]) -> f64 {
        let eligible: f64 = items
            .iter()
            .filter(|i| self.covers(i))
            .map(|i| i.line_total())
            .sum();
        eligible * self.percent / 100.0
    }
}
