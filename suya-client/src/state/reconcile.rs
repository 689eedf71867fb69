//! Reconciliation of server pushes into local state
//!
//! Pure functions, one per entity type, so the conflict policy is
//! unit-testable apart from any transport. Identity filtering happens
//! here: an event for another user must never mutate this user's
//! state.

use shared::models::{CartItem, Order, Product};

/// Outcome of applying a server push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    /// The event's identity does not belong to this session
    IgnoredIdentity,
    /// No local entity with a matching id
    NotFound,
}

/// Merge a server-pushed order update into the local list by order id.
///
/// The updated record replaces the matching entry in place; unrelated
/// entries keep their position and contents regardless of event
/// arrival order.
pub fn merge_order_update(
    orders: &mut [Order],
    update: Order,
    identity: Option<&str>,
) -> MergeOutcome {
    if identity != Some(update.email.as_str()) {
        return MergeOutcome::IgnoredIdentity;
    }
    match orders.iter_mut().find(|o| o.id == update.id) {
        Some(existing) => {
            *existing = update;
            MergeOutcome::Applied
        }
        None => MergeOutcome::NotFound,
    }
}

/// Insert a server-confirmed new order, deduplicating by id.
///
/// New orders land at the front: order lists render newest first.
pub fn insert_new_order(
    orders: &mut Vec<Order>,
    order: Order,
    identity: Option<&str>,
) -> MergeOutcome {
    if identity != Some(order.email.as_str()) {
        return MergeOutcome::IgnoredIdentity;
    }
    if orders.iter().any(|o| o.id == order.id) {
        // Already known (resync raced the push); the update path owns
        // LWW replacement
        return MergeOutcome::NotFound;
    }
    orders.insert(0, order);
    MergeOutcome::Applied
}

/// Recompute cart line prices after a product update.
///
/// Walks items referencing the product and recomputes the unit price
/// from the new size table plus the per-extra surcharge. An item is
/// only touched when the recomputed price differs; a size that
/// vanished from the table leaves the line at its old price. Returns
/// whether anything changed.
pub fn reprice_items(items: &mut [CartItem], product: &Product) -> bool {
    let Some(product_id) = product.id.as_deref() else {
        return false;
    };

    let mut changed = false;
    for item in items.iter_mut().filter(|i| i.product_id == product_id) {
        if let Some(price) = product.unit_price(&item.size, item.extras.len()) {
            if price != item.price {
                item.price = price;
                changed = true;
            }
        }
    }
    changed
}
