//! Order lifecycle tracking
//!
//! The client never computes the next order state; it renders whatever
//! the server's current status is and offers the single
//! customer-triggerable transition (mark-received, see
//! [`shared::models::Order::can_mark_received`]). This module derives
//! the progress view and runs the cosmetic per-order countdown.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use shared::models::{Order, OrderStatus};
use shared::util::now_millis;

/// Delivery-estimate parameters for the countdown display.
#[derive(Debug, Clone, Copy)]
pub struct EtaConfig {
    pub base_seconds: i64,
    /// Added when the kitchen reports itself busy
    pub busy_extra_seconds: i64,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            base_seconds: 30 * 60,
            busy_extra_seconds: 10 * 60,
        }
    }
}

/// Remaining estimate in seconds: `max(0, base + busy_extra - elapsed)`.
///
/// A cosmetic estimate, not authoritative; it floors at zero rather
/// than going negative for long-running orders.
pub fn remaining_seconds(created_at_ms: i64, busy: bool, config: &EtaConfig, now_ms: i64) -> i64 {
    let elapsed = (now_ms - created_at_ms) / 1000;
    let allowance = config.base_seconds + if busy { config.busy_extra_seconds } else { 0 };
    (allowance - elapsed).max(0)
}

/// Progress-bar view of one order.
#[derive(Debug, Clone, Copy)]
pub struct OrderProgress {
    /// The step sequence for the order's delivery method
    pub steps: &'static [OrderStatus],
    /// Index of the current step; unknown statuses degrade to 0
    pub current: usize,
    pub can_mark_received: bool,
}

pub fn progress(order: &Order) -> OrderProgress {
    OrderProgress {
        steps: order.method.progress(),
        current: order.step_index(),
        can_mark_received: order.can_mark_received(),
    }
}

/// Per-order countdown ticker.
///
/// Recomputes the remaining estimate once per second and publishes it
/// over a watch channel; each order gets its own ticker so estimates
/// tick down independently. The ticker stops when cancelled or when
/// the estimate reaches zero.
#[derive(Debug)]
pub struct CountdownTicker {
    token: CancellationToken,
}

impl CountdownTicker {
    pub fn spawn(order: &Order, busy: bool, config: EtaConfig) -> (Self, watch::Receiver<i64>) {
        let created_at = order.created_at;
        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(remaining_seconds(created_at, busy, &config, now_millis()));

        let task_token = token.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
            ticker.tick().await; // immediate first tick already published
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let remaining = remaining_seconds(created_at, busy, &config, now_millis());
                        if tx.send(remaining).is_err() {
                            break; // no watchers left
                        }
                        if remaining == 0 {
                            break;
                        }
                    }
                }
            }
        });

        (Self { token }, rx)
    }

    /// Idempotent stop.
    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::DeliveryMethod;

    #[test]
    fn test_remaining_seconds_floors_at_zero() {
        let config = EtaConfig {
            base_seconds: 60,
            busy_extra_seconds: 30,
        };
        // 2 minutes elapsed against a 60s allowance
        assert_eq!(remaining_seconds(0, false, &config, 120_000), 0);
        // busy adds the extra allowance
        assert_eq!(remaining_seconds(0, true, &config, 60_000), 30);
        assert_eq!(remaining_seconds(0, false, &config, 15_000), 45);
    }

    #[test]
    fn test_progress_view_for_unknown_status() {
        let order = Order {
            id: "o1".to_string(),
            record_id: "orders:o1".to_string(),
            status: OrderStatus::Unknown,
            created_at: 0,
            delivered_at: None,
            items: vec![],
            total: 0.0,
            delivery_fee: 0.0,
            method: DeliveryMethod::Delivery,
            rider: None,
            pings: vec![],
            email: "a@b.c".to_string(),
            address: "x".to_string(),
            phone: None,
        };

        let view = progress(&order);
        assert_eq!(view.current, 0);
        assert_eq!(view.steps.len(), 5);
        assert!(!view.can_mark_received);
    }
}
