/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an opaque cart-line id.
///
/// Line ids are cart-scoped only; they never leave the client except as
/// part of a cart snapshot, so a random UUID is sufficient.
pub fn line_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Derive the client-local order id from a server record id.
///
/// Server record ids carry a table prefix (`orders:abc123`); the client
/// keys its order list by the bare id.
pub fn client_order_id(record_id: &str) -> String {
    match record_id.split_once(':') {
        Some((_, id)) => id.to_string(),
        None => record_id.to_string(),
    }
}
