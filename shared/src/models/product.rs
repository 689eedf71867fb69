//! Product Model

use serde::{Deserialize, Serialize};

/// Flat surcharge added to the unit price per selected extra, in naira.
pub const EXTRA_SURCHARGE: f64 = 200.0;

/// Price entry for one product size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizePrice {
    /// Size key (e.g. "SMALL", "REGULAR", "LARGE")
    pub size: String,
    /// Base price in naira
    pub price: f64,
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Category name (used for promo restriction matching)
    pub category: String,
    /// Size price table, in display order
    pub prices: Vec<SizePrice>,
    /// Extras offered with this product (names only; each adds
    /// [`EXTRA_SURCHARGE`] to the unit price)
    #[serde(default)]
    pub extras: Vec<String>,
    pub available: bool,
}

impl Product {
    /// Base price for a size key, if the size exists.
    pub fn price_for(&self, size: &str) -> Option<f64> {
        self.prices.iter().find(|p| p.size == size).map(|p| p.price)
    }

    /// Unit price for a size plus a number of selected extras.
    pub fn unit_price(&self, size: &str, extras_count: usize) -> Option<f64> {
        self.price_for(size)
            .map(|base| base + extras_count as f64 * EXTRA_SURCHARGE)
    }
}

/// Create product payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: String,
    pub prices: Vec<SizePrice>,
    pub extras: Option<Vec<String>>,
}

/// Update product payload (admin)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub prices: Option<Vec<SizePrice>>,
    pub extras: Option<Vec<String>>,
    pub available: Option<bool>,
}
