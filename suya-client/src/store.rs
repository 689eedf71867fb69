//! Durable local state
//!
//! One JSON file per key under the configured data directory, written
//! synchronously on every mutation so state survives reload. Missing
//! or corrupt files degrade to "no stored value" with a log; startup
//! must never fail because a cache file went bad.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use shared::models::{CartItem, PendingOrder, UserProfile};

const CART_KEY: &str = "cart";
const PROFILE_KEY: &str = "user_profile";
const PENDING_ORDER_KEY: &str = "pending_order";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable key-value store backed by per-key JSON files.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read a value; missing or unparseable files yield `None`.
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read local state");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupt local state");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(self.path(key), content)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    // ============ Cart ============

    pub fn load_cart(&self) -> Vec<CartItem> {
        self.read(CART_KEY).unwrap_or_default()
    }

    pub fn save_cart(&self, items: &[CartItem]) -> Result<(), StoreError> {
        self.write(CART_KEY, &items)
    }

    // ============ Profile ============

    pub fn load_profile(&self) -> Option<UserProfile> {
        self.read(PROFILE_KEY)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.write(PROFILE_KEY, profile)
    }

    // ============ Pending order (payment redirect bridge) ============

    pub fn load_pending_order(&self) -> Option<PendingOrder> {
        self.read(PENDING_ORDER_KEY)
    }

    pub fn save_pending_order(&self, draft: &PendingOrder) -> Result<(), StoreError> {
        self.write(PENDING_ORDER_KEY, draft)
    }

    pub fn clear_pending_order(&self) -> Result<(), StoreError> {
        self.remove(PENDING_ORDER_KEY)
    }
}
