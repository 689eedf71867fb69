//! Rider Model

use serde::{Deserialize, Serialize};

/// Rider duty status.
///
/// `Offline` is the sentinel that removes the rider from live maps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiderStatus {
    Available,
    Busy,
    #[default]
    Offline,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Rider entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub status: RiderStatus,
}

/// Create rider payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderCreate {
    pub name: String,
    pub phone: Option<String>,
    pub image: Option<String>,
}

/// Update rider payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiderUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub status: Option<RiderStatus>,
}
