//! Order ratings

use serde::{Deserialize, Serialize};

/// One customer rating for a delivered order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub order_id: String,
    /// 1-5
    pub stars: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub email: String,
    /// Unix millis
    pub created_at: i64,
}
