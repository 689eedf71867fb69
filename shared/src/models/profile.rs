//! User profile
//!
//! The email address is the sole cross-session identity key. It is not
//! a database id; server pushes are correlated to "this is my data" by
//! email equality and nothing else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Named saved address ("home", "work").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub label: String,
    pub address: String,
}

/// Identity plus delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Cross-system identity key
    pub email: String,
    /// Free-text delivery address
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Favorited product ids
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub favorites: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saved_addresses: Vec<SavedAddress>,
}

impl UserProfile {
    pub fn new(email: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            address: address.into(),
            phone: None,
            favorites: BTreeSet::new(),
            saved_addresses: Vec::new(),
        }
    }

    /// Toggle a product in the favorites set; returns the new state.
    pub fn toggle_favorite(&mut self, product_id: &str) -> bool {
        if self.favorites.remove(product_id) {
            false
        } else {
            self.favorites.insert(product_id.to_string());
            true
        }
    }
}
