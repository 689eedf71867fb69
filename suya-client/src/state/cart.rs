//! Cart State Manager
//!
//! Owns the cart line items and promo state. Local mutations apply
//! immediately, persist to the durable store, and broadcast a full
//! snapshot keyed by identity so other sessions of the same identity
//! converge. Remote snapshots replace the local list wholesale
//! (last-writer-wins; concurrent edits across tabs are not merged).

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::channel::{EventChannelClient, Subscription};
use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::state::{reconcile, SessionIdentity};
use crate::store::LocalStore;
use shared::client::PromoValidationRequest;
use shared::events::{CartClearPayload, CartSyncPayload, EventName};
use shared::models::{AppliedPromo, CartItem, Product, StoreSettings};
use shared::util::line_id;

/// Promo validation seam (the backend owns all promo rules).
#[async_trait]
pub trait PromoValidator: Send + Sync {
    async fn validate(&self, request: &PromoValidationRequest) -> ClientResult<AppliedPromo>;
}

#[async_trait]
impl PromoValidator for ApiClient {
    async fn validate(&self, request: &PromoValidationRequest) -> ClientResult<AppliedPromo> {
        self.validate_promo(request).await
    }
}

/// Result of a promo application attempt. Never an `Err`: failures
/// surface as a message for the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PromoOutcome {
    Applied(AppliedPromo),
    Rejected(String),
}

#[derive(Debug)]
struct CartState {
    items: Vec<CartItem>,
    promo: Option<AppliedPromo>,
    delivery_fee: f64,
}

/// Cart state manager.
#[derive(Debug, Clone)]
pub struct CartManager {
    state: Arc<Mutex<CartState>>,
    store: LocalStore,
    channel: EventChannelClient,
    identity: SessionIdentity,
}

impl CartManager {
    /// Load the cart from the durable store.
    pub fn load(store: LocalStore, channel: EventChannelClient, identity: SessionIdentity) -> Self {
        let items = store.load_cart();
        Self {
            state: Arc::new(Mutex::new(CartState {
                items,
                // promos are never persisted; they must be re-validated
                promo: None,
                delivery_fee: StoreSettings::default().delivery_fee,
            })),
            store,
            channel,
            identity,
        }
    }

    // ============ Derived values ============

    pub fn items(&self) -> Vec<CartItem> {
        self.lock().items.clone()
    }

    pub fn promo(&self) -> Option<AppliedPromo> {
        self.lock().promo.clone()
    }

    pub fn delivery_fee(&self) -> f64 {
        self.lock().delivery_fee
    }

    /// Sum of unit price x quantity over all lines.
    pub fn subtotal(&self) -> f64 {
        self.lock().items.iter().map(|i| i.line_total()).sum()
    }

    /// Discount from the applied promo, if any.
    pub fn discount(&self) -> f64 {
        let state = self.lock();
        state
            .promo
            .as_ref()
            .map(|p| p.discount_on(&state.items))
            .unwrap_or(0.0)
    }

    /// Subtotal minus discount. The delivery fee is added at checkout.
    pub fn total(&self) -> f64 {
        self.subtotal() - self.discount()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    // ============ Mutations (optimistic, persist + broadcast) ============

    /// Append a configured line and broadcast the new snapshot.
    ///
    /// The line always gets a fresh id here; callers may pass items
    /// whose ids came from elsewhere (a reorder snapshot).
    pub async fn add(&self, mut item: CartItem) {
        item.line_id = line_id();
        {
            let mut state = self.lock();
            state.items.push(item);
            self.persist(&state);
        }
        self.broadcast_snapshot().await;
    }

    /// Batch append, used for "reorder".
    pub async fn add_many(&self, mut items: Vec<CartItem>) {
        for item in &mut items {
            item.line_id = line_id();
        }
        {
            let mut state = self.lock();
            state.items.extend(items);
            self.persist(&state);
        }
        self.broadcast_snapshot().await;
    }

    /// Remove a line by id.
    pub async fn remove(&self, line_id: &str) {
        {
            let mut state = self.lock();
            state.items.retain(|i| i.line_id != line_id);
            self.persist(&state);
        }
        self.broadcast_snapshot().await;
    }

    /// Adjust a line's quantity by a delta.
    ///
    /// Quantity never drops below 1: a decrement at quantity 1 removes
    /// the line instead.
    pub async fn adjust_quantity(&self, line_id: &str, delta: i32) {
        {
            let mut state = self.lock();
            let Some(index) = state.items.iter().position(|i| i.line_id == line_id) else {
                return;
            };
            let quantity = state.items[index].quantity;
            if quantity == 1 && delta < 0 {
                state.items.remove(index);
            } else {
                state.items[index].quantity = (quantity + delta).max(1);
            }
            self.persist(&state);
        }
        self.broadcast_snapshot().await;
    }

    /// Empty the cart and drop any applied promo.
    ///
    /// Broadcasts a distinct clear signal: an empty snapshot would be
    /// ambiguous with "not yet loaded" on the receiving side.
    pub async fn clear(&self) {
        {
            let mut state = self.lock();
            state.items.clear();
            state.promo = None;
            self.persist(&state);
        }
        let payload = CartClearPayload {
            email: self.identity.get(),
        };
        if let Err(e) = self.channel.emit(EventName::CartCleared, &payload).await {
            tracing::debug!(error = %e, "Dropped cart-clear broadcast");
        }
    }

    /// Validate and apply a promo code against the current cart.
    ///
    /// A failed validation clears any previously applied promo and
    /// yields the error message for the UI; this never propagates an
    /// error to the caller.
    pub async fn apply_promo(&self, validator: &dyn PromoValidator, code: &str) -> PromoOutcome {
        let request = PromoValidationRequest {
            code: code.to_string(),
            items: self.items(),
        };
        match validator.validate(&request).await {
            Ok(promo) => {
                self.lock().promo = Some(promo.clone());
                PromoOutcome::Applied(promo)
            }
            Err(e) => {
                self.lock().promo = None;
                tracing::warn!(code = %code, error = %e, "Promo validation failed");
                PromoOutcome::Rejected(format!("failed to validate promo: {e}"))
            }
        }
    }

    // ============ Reactive inputs ============

    /// Subscribe to the remote events this manager reconciles.
    ///
    /// The returned subscriptions must be held for the manager's
    /// lifetime and dropped on teardown.
    pub fn attach(&self) -> Vec<Subscription> {
        let snapshot = {
            let manager = self.clone();
            self.channel
                .subscribe(EventName::CartUpdated, move |msg| match msg.parse_payload::<CartSyncPayload>() {
                    Ok(payload) => manager.apply_remote_snapshot(payload),
                    Err(e) => tracing::warn!(error = %e, "Malformed cart snapshot"),
                })
        };

        let cleared = {
            let manager = self.clone();
            self.channel
                .subscribe(EventName::CartCleared, move |msg| match msg.parse_payload::<CartClearPayload>() {
                    Ok(payload) => manager.apply_remote_clear(payload),
                    Err(e) => tracing::warn!(error = %e, "Malformed cart-clear signal"),
                })
        };

        let product = {
            let manager = self.clone();
            self.channel
                .subscribe(EventName::ProductUpdated, move |msg| match msg.parse_payload::<Product>() {
                    Ok(product) => manager.apply_product_update(&product),
                    Err(e) => tracing::warn!(error = %e, "Malformed product update"),
                })
        };

        let settings = {
            let manager = self.clone();
            self.channel
                .subscribe(EventName::SettingsUpdated, move |msg| match msg.parse_payload::<StoreSettings>() {
                    Ok(settings) => manager.apply_settings(&settings),
                    Err(e) => tracing::warn!(error = %e, "Malformed settings update"),
                })
        };

        vec![snapshot, cleared, product, settings]
    }

    /// Replace the local list with a remote snapshot (last-writer-wins).
    fn apply_remote_snapshot(&self, payload: CartSyncPayload) {
        if payload.email != self.identity.get() {
            return;
        }
        let mut state = self.lock();
        state.items = payload.items;
        self.persist(&state);
    }

    fn apply_remote_clear(&self, payload: CartClearPayload) {
        if payload.email != self.identity.get() {
            return;
        }
        let mut state = self.lock();
        state.items.clear();
        state.promo = None;
        self.persist(&state);
    }

    /// Recompute line prices for an updated product, persisting only
    /// when something actually changed.
    fn apply_product_update(&self, product: &Product) {
        let mut state = self.lock();
        if reconcile::reprice_items(&mut state.items, product) {
            self.persist(&state);
        }
    }

    fn apply_settings(&self, settings: &StoreSettings) {
        self.lock().delivery_fee = settings.delivery_fee;
    }

    // ============ Internals ============

    fn lock(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.state.lock().expect("cart state poisoned")
    }

    fn persist(&self, state: &CartState) {
        if let Err(e) = self.store.save_cart(&state.items) {
            tracing::error!(error = %e, "Failed to persist cart");
        }
    }

    async fn broadcast_snapshot(&self) {
        let payload = CartSyncPayload {
            email: self.identity.get(),
            items: self.items(),
        };
        if let Err(e) = self.channel.emit(EventName::CartUpdated, &payload).await {
            tracing::debug!(error = %e, "Dropped cart broadcast");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use shared::events::ChannelMessage;
    use tempfile::TempDir;
    use tokio::sync::broadcast;

    fn manager() -> (TempDir, CartManager, broadcast::Sender<ChannelMessage>) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let (server_tx, _) = broadcast::channel(64);
        let (client_tx, _) = broadcast::channel(64);
        let channel = EventChannelClient::memory(&server_tx, &client_tx);
        let identity = SessionIdentity::new();
        let manager = CartManager::load(store, channel, identity);
        (dir, manager, client_tx)
    }

    fn item(price: f64, quantity: i32) -> CartItem {
        CartItem {
            line_id: shared::util::line_id(),
            product_id: "p1".to_string(),
            name: "Jollof Rice".to_string(),
            image: None,
            size: "REGULAR".to_string(),
            price,
            extras: vec![],
            note: None,
            quantity,
            category: "Rice".to_string(),
        }
    }

    struct FailingValidator;

    #[async_trait]
    impl PromoValidator for FailingValidator {
        async fn validate(&self, _request: &PromoValidationRequest) -> ClientResult<AppliedPromo> {
            Err(ClientError::Validation("invalid code".to_string()))
        }
    }

    #[tokio::test]
    async fn test_quantity_floor_removes_at_one() {
        let (_dir, manager, _tx) = manager();
        manager.add(item(1500.0, 2)).await;
        let line_id = manager.items()[0].line_id.clone();

        manager.adjust_quantity(&line_id, -1).await;
        assert_eq!(manager.items()[0].quantity, 1);

        // Repeated decrements never drive quantity below 1; at 1 the
        // line is removed instead
        manager.adjust_quantity(&line_id, -1).await;
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_total_is_price_times_quantity() {
        let (_dir, manager, _tx) = manager();
        manager.add(item(1500.0, 2)).await;
        manager.add(item(900.0, 1)).await;
        assert_eq!(manager.subtotal(), 3900.0);
        assert_eq!(manager.total(), 3900.0);
    }

    #[tokio::test]
    async fn test_promo_clears_on_failure() {
        let (_dir, manager, _tx) = manager();
        manager.add(item(1000.0, 1)).await;
        manager.lock().promo = Some(AppliedPromo {
            code: "X".to_string(),
            percent: 10.0,
            categories: vec![],
        });

        let outcome = manager.apply_promo(&FailingValidator, "BAD").await;
        assert!(matches!(outcome, PromoOutcome::Rejected(_)));
        assert!(manager.promo().is_none());
        assert_eq!(manager.discount(), 0.0);
    }

    #[tokio::test]
    async fn test_clear_emits_distinct_signal() {
        let (_dir, manager, client_tx) = manager();
        let mut rx = client_tx.subscribe();
        manager.add(item(1000.0, 1)).await;
        let _ = rx.recv().await.unwrap(); // snapshot broadcast

        manager.clear().await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.event, EventName::CartCleared);
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_cart_survives_reload() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let (server_tx, _) = broadcast::channel(64);
        let (client_tx, _) = broadcast::channel(64);

        let first = CartManager::load(
            store.clone(),
            EventChannelClient::memory(&server_tx, &client_tx),
            SessionIdentity::new(),
        );
        first.add(item(1500.0, 2)).await;
        let items = first.items();

        // Fresh manager over the same store sees the identical list
        let second = CartManager::load(
            store,
            EventChannelClient::memory(&server_tx, &client_tx),
            SessionIdentity::new(),
        );
        assert_eq!(second.items(), items);
    }
}
