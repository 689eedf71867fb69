use serde::{Deserialize, Serialize};

use crate::models::{CartItem, GeoPoint, RiderStatus, UserProfile};

// ==================== Outbound (client -> server) ====================

/// Join the identity-scoped room so the backend routes identity-scoped
/// events to this connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinPayload {
    pub email: String,
}

/// Table-side service call (dine-in surface).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallWaiterPayload {
    pub table: String,
}

// ==================== Cart / profile sync ====================

/// Full cart snapshot, keyed by identity. `email` is `None` for
/// anonymous sessions (the snapshot is then tab-local only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSyncPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub items: Vec<CartItem>,
}

/// Cart-clear signal, keyed by identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartClearPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Profile replacement, emitted locally and echoed to other sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSyncPayload {
    pub profile: UserProfile,
}

// ==================== Location ====================

/// Rider location sample with duty status. Sent by the rider client
/// and rebroadcast by the server under `riderLocationUpdated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderLocationUpdate {
    pub rider_id: String,
    pub location: GeoPoint,
    pub status: RiderStatus,
}

/// Customer location sharing broadcast. A payload with
/// `is_sharing == false` removes the customer from live maps even when
/// a stale location value is still attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerLocationUpdate {
    pub email: String,
    pub location: GeoPoint,
    pub is_sharing: bool,
}

// ==================== Catalog ====================

/// Product removal push; creations and updates carry the full
/// [`crate::models::Product`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDeletedPayload {
    pub id: String,
}
