//! Checkout flow
//!
//! Bridges the payment redirect: [`begin`] snapshots the cart into a
//! durable [`PendingOrder`] draft and returns the provider redirect
//! URL; after the redirect round trip, [`complete`] verifies the
//! reference and replays the exact stored draft as the order-create
//! request. The draft is deleted on every exit from `complete`,
//! success or failure, so a retry can never double-submit.
//!
//! [`begin`]: CheckoutFlow::begin
//! [`complete`]: CheckoutFlow::complete

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::state::{CartManager, IdentityManager};
use crate::store::{LocalStore, StoreError};
use shared::client::{PaymentInitRequest, PaymentInitResponse};
use shared::models::{DeliveryMethod, Order, PendingOrder};
use shared::util::now_millis;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("no delivery profile on file")]
    MissingProfile,

    #[error("no pending order draft")]
    MissingDraft,

    #[error("payment initialization failed: {0}")]
    PaymentInit(#[source] ClientError),

    /// The provider reference did not verify; the checkout is dead and
    /// the user returns to the cart.
    #[error("payment could not be verified")]
    VerificationFailed,

    #[error("payment verification failed: {0}")]
    Verify(#[source] ClientError),

    /// Payment went through but the backend rejected order creation;
    /// equally fatal to this checkout attempt.
    #[error("order creation failed: {0}")]
    OrderCreate(#[source] ClientError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Payment/order seam for the checkout flow (the backend plus the
/// payment provider behind it).
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn initialize(&self, request: &PaymentInitRequest) -> ClientResult<PaymentInitResponse>;
    async fn verify(&self, reference: &str) -> ClientResult<bool>;
    async fn create_order(&self, draft: &PendingOrder) -> ClientResult<Order>;
}

#[async_trait]
impl PaymentBackend for ApiClient {
    async fn initialize(&self, request: &PaymentInitRequest) -> ClientResult<PaymentInitResponse> {
        self.initialize_payment(request).await
    }

    async fn verify(&self, reference: &str) -> ClientResult<bool> {
        self.verify_payment(reference).await
    }

    async fn create_order(&self, draft: &PendingOrder) -> ClientResult<Order> {
        ApiClient::create_order(self, draft).await
    }
}

/// Drives a single checkout across the payment redirect.
pub struct CheckoutFlow {
    backend: Arc<dyn PaymentBackend>,
    store: LocalStore,
    cart: CartManager,
    identity: IdentityManager,
}

impl CheckoutFlow {
    pub fn new(
        backend: Arc<dyn PaymentBackend>,
        store: LocalStore,
        cart: CartManager,
        identity: IdentityManager,
    ) -> Self {
        Self {
            backend,
            store,
            cart,
            identity,
        }
    }

    /// The draft surviving a payment redirect, if any.
    pub fn pending(&self) -> Option<PendingOrder> {
        self.store.load_pending_order()
    }

    /// Initialize payment for the current cart and persist the draft.
    ///
    /// Returns the provider redirect URL and reference. A `begin`
    /// while a draft already exists replaces the draft.
    pub async fn begin(&self, method: DeliveryMethod) -> Result<PaymentInitResponse, CheckoutError> {
        let items = self.cart.items();
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let profile = self.identity.profile().ok_or(CheckoutError::MissingProfile)?;

        let delivery_fee = match method {
            DeliveryMethod::Delivery => self.cart.delivery_fee(),
            DeliveryMethod::Pickup => 0.0,
        };
        let amount = self.cart.total() + delivery_fee;

        let request = PaymentInitRequest {
            email: profile.email.clone(),
            amount,
            metadata: Some(serde_json::json!({ "address": profile.address })),
        };
        let init = self
            .backend
            .initialize(&request)
            .await
            .map_err(CheckoutError::PaymentInit)?;

        let draft = PendingOrder {
            items,
            total: amount,
            delivery_fee,
            method,
            email: profile.email,
            address: profile.address,
            phone: profile.phone,
            reference: init.reference.clone(),
            created_at: now_millis(),
        };
        self.store.save_pending_order(&draft)?;

        Ok(init)
    }

    /// Verify the payment reference and create the order from the
    /// stored draft.
    ///
    /// On success the cart is cleared (distinct clear broadcast) and
    /// the draft removed. Verification and creation failures are fatal
    /// to this checkout; the draft is removed on those paths too.
    pub async fn complete(&self, reference: &str) -> Result<Order, CheckoutError> {
        let draft = self
            .store
            .load_pending_order()
            .ok_or(CheckoutError::MissingDraft)?;

        let verified = match self.backend.verify(reference).await {
            Ok(verified) => verified,
            Err(e) => {
                self.discard_draft();
                return Err(CheckoutError::Verify(e));
            }
        };
        if !verified {
            self.discard_draft();
            return Err(CheckoutError::VerificationFailed);
        }

        let order = match self.backend.create_order(&draft).await {
            Ok(order) => order,
            Err(e) => {
                self.discard_draft();
                return Err(CheckoutError::OrderCreate(e));
            }
        };

        self.discard_draft();
        self.cart.clear().await;
        self.identity.resync_orders().await;

        Ok(order)
    }

    fn discard_draft(&self) {
        if let Err(e) = self.store.clear_pending_order() {
            tracing::error!(error = %e, "Failed to remove pending order draft");
        }
    }
}
