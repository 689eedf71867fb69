//! Local optimistic state and server reconciliation
//!
//! UI actions mutate local state immediately, persist it, and emit an
//! event upstream; server pushes are merged back in by identity key
//! (order id, user email), never by array position. Conflict policy is
//! last-write-wins per entity id: the backend is authoritative for
//! orders and payments, and cart/location data tolerates it.

mod cart;
mod identity;
pub mod reconcile;

pub use cart::{CartManager, PromoOutcome, PromoValidator};
pub use identity::IdentityManager;

use std::sync::{Arc, RwLock};

/// Shared session identity handle.
///
/// The email address is the sole correlation key for inbound pushes;
/// every manager holding this handle filters events through it.
#[derive(Debug, Clone, Default)]
pub struct SessionIdentity(Arc<RwLock<Option<String>>>);

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, email: Option<String>) {
        if let Ok(mut guard) = self.0.write() {
            *guard = email;
        }
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().ok().and_then(|guard| guard.clone())
    }

    /// Whether an inbound event's identity belongs to this session.
    pub fn matches(&self, email: &str) -> bool {
        self.get().as_deref() == Some(email)
    }
}
