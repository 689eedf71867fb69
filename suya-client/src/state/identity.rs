//! Identity & Order History Manager
//!
//! Owns the user profile and the order list. The profile is one
//! source of truth in its own right (persisted locally, broadcast to
//! sibling sessions, reconciled opportunistically); orders are
//! server-authoritative and only ever merged in by id.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;

use crate::channel::{ConnectionStatus, EventChannelClient, Subscription};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::state::{reconcile, SessionIdentity};
use crate::store::LocalStore;
use shared::client::StatusUpdateRequest;
use shared::events::{EventName, ProfileSyncPayload};
use shared::models::{Order, OrderStatus, UserProfile};
use shared::util::client_order_id;

/// Actor tag sent when the customer self-reports receipt.
const COMPLETED_BY_USER: &str = "user";

/// Identity and order history manager.
#[derive(Debug, Clone)]
pub struct IdentityManager {
    profile: Arc<RwLock<Option<UserProfile>>>,
    orders: Arc<RwLock<Vec<Order>>>,
    loading: Arc<AtomicBool>,
    identity: SessionIdentity,
    store: LocalStore,
    api: ApiClient,
    channel: EventChannelClient,
}

impl IdentityManager {
    /// Load the profile from the durable store and adopt its identity.
    pub fn load(
        store: LocalStore,
        api: ApiClient,
        channel: EventChannelClient,
        identity: SessionIdentity,
    ) -> Self {
        let profile = store.load_profile();
        identity.set(profile.as_ref().map(|p| p.email.clone()));
        Self {
            profile: Arc::new(RwLock::new(profile)),
            orders: Arc::new(RwLock::new(Vec::new())),
            loading: Arc::new(AtomicBool::new(false)),
            identity,
            store,
            api,
            channel,
        }
    }

    /// Join the identity room and run the initial order resync.
    pub async fn start(&self) {
        if let Some(email) = self.identity.get() {
            if let Err(e) = self.channel.set_identity(&email).await {
                tracing::warn!(error = %e, "Failed to join identity room");
            }
            self.resync_orders().await;
        }
    }

    /// Re-fetch authoritative order state after every reconnect.
    ///
    /// Pushes missed while the channel was down are never replayed, so
    /// a reconnect without a resync would leave the order list stale
    /// indefinitely.
    pub fn spawn_reconnect_resync(&self) -> JoinHandle<()> {
        let manager = self.clone();
        let mut status = self.channel.status();
        tokio::spawn(async move {
            let mut was_down = false;
            loop {
                if status.changed().await.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                match current {
                    ConnectionStatus::Reconnecting { .. } | ConnectionStatus::Disconnected => {
                        was_down = true;
                    }
                    ConnectionStatus::Connected => {
                        if was_down {
                            was_down = false;
                            tracing::info!("Channel reconnected, resyncing orders");
                            manager.resync_orders().await;
                        }
                    }
                }
            }
        })
    }

    // ============ Accessors ============

    pub fn profile(&self) -> Option<UserProfile> {
        self.profile.read().ok().and_then(|p| p.clone())
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.read().map(|o| o.clone()).unwrap_or_default()
    }

    /// Orders that are neither delivered nor awaiting payment, in
    /// their stored relative order.
    pub fn active_orders(&self) -> Vec<Order> {
        self.orders()
            .into_iter()
            .filter(|o| o.status.is_active())
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    // ============ Profile ============

    /// Replace the profile, persist it, broadcast it, and resync
    /// orders under the (possibly new) identity.
    pub async fn update_profile(&self, profile: UserProfile) {
        if let Err(e) = self.store.save_profile(&profile) {
            tracing::error!(error = %e, "Failed to persist profile");
        }
        self.identity.set(Some(profile.email.clone()));
        if let Ok(mut guard) = self.profile.write() {
            *guard = Some(profile.clone());
        }

        if let Err(e) = self.channel.set_identity(&profile.email).await {
            tracing::warn!(error = %e, "Failed to join identity room");
        }
        let payload = ProfileSyncPayload {
            profile: profile.clone(),
        };
        if let Err(e) = self.channel.emit(EventName::UserProfileUpdated, &payload).await {
            tracing::debug!(error = %e, "Dropped profile broadcast");
        }

        self.resync_orders().await;
    }

    /// Apply a profile echo from a sibling session.
    fn apply_remote_profile(&self, payload: ProfileSyncPayload) {
        if !self.identity.matches(&payload.profile.email) {
            return;
        }
        if let Err(e) = self.store.save_profile(&payload.profile) {
            tracing::error!(error = %e, "Failed to persist profile");
        }
        if let Ok(mut guard) = self.profile.write() {
            *guard = Some(payload.profile);
        }
    }

    // ============ Orders ============

    /// Fetch the full order history and replace the local list.
    ///
    /// With no identity this is a no-op that clears the loading flag.
    /// A fetch failure keeps the previous list: stale-but-available
    /// beats a blanked screen.
    pub async fn resync_orders(&self) {
        let Some(email) = self.identity.get() else {
            self.loading.store(false, Ordering::SeqCst);
            return;
        };

        self.loading.store(true, Ordering::SeqCst);
        match self.api.fetch_orders(&email).await {
            Ok(orders) => {
                let normalized: Vec<Order> = orders.into_iter().map(Self::normalize).collect();
                if let Ok(mut guard) = self.orders.write() {
                    *guard = normalized;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order resync failed, keeping previous state");
            }
        }
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Self-report receipt of an order, then resync.
    pub async fn complete_order(&self, id: &str) -> ClientResult<()> {
        let record_id = self
            .orders()
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.record_id.clone())
            .ok_or_else(|| ClientError::NotFound(format!("order {id}")))?;

        let update = StatusUpdateRequest {
            status: OrderStatus::Delivered,
            completed_by: Some(COMPLETED_BY_USER.to_string()),
        };
        self.api.update_order_status(&record_id, &update).await?;
        self.resync_orders().await;
        Ok(())
    }

    fn normalize(mut order: Order) -> Order {
        if order.id.is_empty() {
            order.id = client_order_id(&order.record_id);
        }
        order
    }

    fn apply_order_update(&self, order: Order) {
        let identity = self.identity.get();
        if let Ok(mut guard) = self.orders.write() {
            let outcome =
                reconcile::merge_order_update(&mut guard, Self::normalize(order), identity.as_deref());
            tracing::debug!(outcome = ?outcome, "Applied order update push");
        }
    }

    fn apply_new_order(&self, order: Order) {
        let identity = self.identity.get();
        if let Ok(mut guard) = self.orders.write() {
            let outcome =
                reconcile::insert_new_order(&mut guard, Self::normalize(order), identity.as_deref());
            tracing::debug!(outcome = ?outcome, "Applied new-order push");
        }
    }

    // ============ Reactive inputs ============

    /// Subscribe to the pushes this manager reconciles. Hold the
    /// returned subscriptions for the manager's lifetime.
    pub fn attach(&self) -> Vec<Subscription> {
        let updated = {
            let manager = self.clone();
            self.channel
                .subscribe(EventName::OrderUpdated, move |msg| match msg.parse_payload::<Order>() {
                    Ok(order) => manager.apply_order_update(order),
                    Err(e) => tracing::warn!(error = %e, "Malformed order update"),
                })
        };

        let created = {
            let manager = self.clone();
            self.channel
                .subscribe(EventName::NewOrder, move |msg| match msg.parse_payload::<Order>() {
                    Ok(order) => manager.apply_new_order(order),
                    Err(e) => tracing::warn!(error = %e, "Malformed new-order push"),
                })
        };

        let profile = {
            let manager = self.clone();
            self.channel.subscribe(EventName::UserProfileUpdated, move |msg| {
                match msg.parse_payload::<ProfileSyncPayload>() {
                    Ok(payload) => manager.apply_remote_profile(payload),
                    Err(e) => tracing::warn!(error = %e, "Malformed profile push"),
                }
            })
        };

        vec![updated, created, profile]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use shared::models::DeliveryMethod;
    use tempfile::TempDir;
    use tokio::sync::broadcast;

    fn manager() -> (TempDir, IdentityManager) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let (server_tx, _) = broadcast::channel(64);
        let (client_tx, _) = broadcast::channel(64);
        let channel = EventChannelClient::memory(&server_tx, &client_tx);
        let api = ApiClient::new(&ClientConfig::default());
        let identity = SessionIdentity::new();
        let manager = IdentityManager::load(store, api, channel, identity);
        (dir, manager)
    }

    fn order(id: &str, email: &str, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            record_id: format!("orders:{id}"),
            status,
            created_at: 0,
            delivered_at: None,
            items: vec![],
            total: 1000.0,
            delivery_fee: 500.0,
            method: DeliveryMethod::Delivery,
            rider: None,
            pings: vec![],
            email: email.to_string(),
            address: "12 Allen Ave".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_active_orders_derivation() {
        let (_dir, manager) = manager();
        manager.identity.set(Some("ada@example.com".to_string()));
        {
            let mut guard = manager.orders.write().unwrap();
            *guard = vec![
                order("1", "ada@example.com", OrderStatus::Delivered),
                order("2", "ada@example.com", OrderStatus::Pending),
                order("3", "ada@example.com", OrderStatus::OutForDelivery),
                order("4", "ada@example.com", OrderStatus::PendingPayment),
            ];
        }

        let active = manager.active_orders();
        let ids: Vec<&str> = active.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_push_for_other_identity_leaves_state_unchanged() {
        let (_dir, manager) = manager();
        manager.identity.set(Some("ada@example.com".to_string()));
        {
            let mut guard = manager.orders.write().unwrap();
            *guard = vec![order("1", "ada@example.com", OrderStatus::Pending)];
        }

        let before = manager.orders();
        manager.apply_order_update(order("1", "intruder@example.com", OrderStatus::Delivered));
        assert_eq!(manager.orders(), before);

        manager.apply_new_order(order("9", "intruder@example.com", OrderStatus::Pending));
        assert_eq!(manager.orders(), before);
    }

    #[tokio::test]
    async fn test_remote_profile_requires_matching_email() {
        let (_dir, manager) = manager();
        manager.identity.set(Some("ada@example.com".to_string()));

        manager.apply_remote_profile(ProfileSyncPayload {
            profile: UserProfile::new("intruder@example.com", "99 Nowhere"),
        });
        assert!(manager.profile().is_none());

        manager.apply_remote_profile(ProfileSyncPayload {
            profile: UserProfile::new("ada@example.com", "1 Marina Rd"),
        });
        assert_eq!(manager.profile().unwrap().address, "1 Marina Rd");
    }

    #[tokio::test]
    async fn test_resync_without_identity_is_noop() {
        let (_dir, manager) = manager();
        manager.resync_orders().await;
        assert!(!manager.is_loading());
        assert!(manager.orders().is_empty());
    }
}
