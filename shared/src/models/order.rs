//! Order Model
//!
//! Orders are created by the backend after payment confirmation. The
//! client never constructs the authoritative record; it holds a
//! [`PendingOrder`] draft across the payment redirect and thereafter
//! only merges server-pushed updates by id.

use serde::{Deserialize, Serialize};

use super::cart::CartItem;

/// Order status as reported by the backend.
///
/// `PendingPayment` is a pre-order sentinel (draft awaiting payment
/// confirmation) and is excluded from the active view and from progress
/// rendering. `Unknown` absorbs unrecognized wire values so a newer
/// backend cannot crash an older client; it renders as the first step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    #[default]
    Pending,
    Preparing,
    ReadyForDelivery,
    OutForDelivery,
    Delivered,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Terminal: the order has moved to history and is immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    /// Active: neither terminal nor the pre-payment sentinel.
    pub fn is_active(&self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::PendingPayment)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::PendingPayment => write!(f, "Pending Payment"),
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Preparing => write!(f, "Preparing"),
            OrderStatus::ReadyForDelivery => write!(f, "Ready for Delivery"),
            OrderStatus::OutForDelivery => write!(f, "Out for Delivery"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Unknown => write!(f, "Processing"),
        }
    }
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    #[default]
    Delivery,
    Pickup,
}

impl DeliveryMethod {
    /// Progress steps rendered for this method, in order.
    ///
    /// Pick-up orders are handed over directly from "Ready for
    /// Delivery" and never enter "Out for Delivery".
    pub fn progress(&self) -> &'static [OrderStatus] {
        match self {
            DeliveryMethod::Delivery => &[
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::ReadyForDelivery,
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered,
            ],
            DeliveryMethod::Pickup => &[
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::ReadyForDelivery,
                OrderStatus::Delivered,
            ],
        }
    }
}

/// Assigned rider descriptor, denormalized onto the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderInfo {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Liveness/arrival confirmation ping attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPing {
    /// Unix millis
    pub timestamp: i64,
    #[serde(default)]
    pub acknowledged: bool,
}

/// One placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Client-local id, derived from the server record id
    pub id: String,
    /// Server record id (`orders:<id>`)
    pub record_id: String,
    pub status: OrderStatus,
    /// Unix millis
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    /// Frozen snapshot of the cart at purchase time; later product
    /// edits must never reach historical orders
    pub items: Vec<CartItem>,
    /// Total in naira, delivery fee included
    pub total: f64,
    pub delivery_fee: f64,
    pub method: DeliveryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider: Option<RiderInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pings: Vec<OrderPing>,
    /// Purchaser identity/contact snapshot at order time
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Order {
    /// Index of the current step in this order's progress sequence.
    ///
    /// Unknown and pre-payment statuses degrade to the first step.
    pub fn step_index(&self) -> usize {
        self.method
            .progress()
            .iter()
            .position(|s| *s == self.status)
            .unwrap_or(0)
    }

    /// Whether the customer may self-report receipt right now.
    ///
    /// Forward transitions are admin-issued; mark-received is the one
    /// customer-triggerable transition.
    pub fn can_mark_received(&self) -> bool {
        match self.method {
            DeliveryMethod::Delivery => {
                self.rider.is_some()
                    && matches!(
                        self.status,
                        OrderStatus::ReadyForDelivery | OrderStatus::OutForDelivery
                    )
            }
            DeliveryMethod::Pickup => matches!(self.status, OrderStatus::ReadyForDelivery),
        }
    }
}

/// Pre-payment order draft.
///
/// Persisted locally before the payment redirect and replayed as the
/// order-create request body once the payment reference verifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub items: Vec<CartItem>,
    /// Total in naira, delivery fee included
    pub total: f64,
    pub delivery_fee: f64,
    pub method: DeliveryMethod,
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Payment provider reference, set by payment initialization
    pub reference: String,
    /// Unix millis
    pub created_at: i64,
}
