//! Store settings

use serde::{Deserialize, Serialize};

/// Opening hours, "HH:MM" local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub opens_at: String,
    pub closes_at: String,
}

/// Platform settings pushed to every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Delivery fee in naira, added at checkout
    pub delivery_fee: f64,
    /// Whether the kitchen is currently accepting orders
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<OpeningHours>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            delivery_fee: 500.0,
            open: true,
            hours: None,
        }
    }
}

/// Update settings payload (admin)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub delivery_fee: Option<f64>,
    pub open: Option<bool>,
    pub hours: Option<OpeningHours>,
}
