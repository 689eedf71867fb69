//! Client-related types shared between the backend and clients
//!
//! Request/response DTOs used in API communication, plus the unified
//! response envelope.

use serde::{Deserialize, Serialize};

use crate::models::{CartItem, OrderStatus, PayoutAccount};

/// Standard API response code
pub const API_CODE_SUCCESS: &str = "E0000";

/// Unified API response structure
///
/// All API responses follow this format:
/// ```json
/// {
///     "code": "E0000",
///     "message": "Success",
///     "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (E0000 = success, others = error codes)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Response data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            code: API_CODE_SUCCESS.to_string(),
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    /// Create an error response
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == API_CODE_SUCCESS
    }
}

// =============================================================================
// Payment API DTOs
// =============================================================================

/// Initialize payment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitRequest {
    pub email: String,
    /// Amount in naira
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Initialize payment response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitResponse {
    /// Provider-hosted page the customer is redirected to
    pub authorization_url: String,
    /// Reference used to verify the payment after the redirect
    pub reference: String,
}

/// Verify payment response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerifyResponse {
    pub verified: bool,
}

// =============================================================================
// Order API DTOs
// =============================================================================

/// Update order status request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
    /// Actor tag ("user" when the customer self-reports receipt)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
}

/// Assign rider to order request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRiderRequest {
    pub rider_id: String,
}

// =============================================================================
// Promo API DTOs
// =============================================================================

/// Validate a promo code against the current cart contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoValidationRequest {
    pub code: String,
    pub items: Vec<CartItem>,
}

// =============================================================================
// Push notification DTOs
// =============================================================================

/// VAPID public key response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VapidKeyResponse {
    pub public_key: String,
}

/// Browser push subscription keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Push subscription registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// =============================================================================
// Payout API DTOs
// =============================================================================

/// Verify payout account request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyAccountRequest {
    pub account_number: String,
    pub bank_code: String,
}

/// Verify payout account response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyAccountResponse {
    pub account: PayoutAccount,
}

// =============================================================================
// Upload DTOs
// =============================================================================

/// Image upload response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}
