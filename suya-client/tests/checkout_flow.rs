// Checkout scenarios: the pending-order draft must bridge the payment
// redirect exactly once, and must be cleaned up on every exit.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use shared::client::{PaymentInitRequest, PaymentInitResponse};
use suya_client::models::{
    CartItem, DeliveryMethod, Order, OrderStatus, PendingOrder, UserProfile,
};
use suya_client::{
    ApiClient, CartManager, CheckoutError, CheckoutFlow, ClientConfig, ClientError, ClientResult,
    EventChannelClient, IdentityManager, LocalStore, PaymentBackend, SessionIdentity,
};
use tempfile::TempDir;
use tokio::sync::broadcast;

const EMAIL: &str = "ada@example.com";
const REFERENCE: &str = "ref-12345";

#[derive(Default)]
struct RecordingBackend {
    verify_ok: AtomicBool,
    create_fails: AtomicBool,
    init_calls: Mutex<Vec<PaymentInitRequest>>,
    verify_calls: Mutex<Vec<String>>,
    create_calls: Mutex<Vec<PendingOrder>>,
}

#[async_trait]
impl PaymentBackend for RecordingBackend {
    async fn initialize(&self, request: &PaymentInitRequest) -> ClientResult<PaymentInitResponse> {
        self.init_calls.lock().unwrap().push(request.clone());
        Ok(PaymentInitResponse {
            authorization_url: "https://pay.example.com/checkout".to_string(),
            reference: REFERENCE.to_string(),
        })
    }

    async fn verify(&self, reference: &str) -> ClientResult<bool> {
        self.verify_calls.lock().unwrap().push(reference.to_string());
        Ok(self.verify_ok.load(Ordering::SeqCst))
    }

    async fn create_order(&self, draft: &PendingOrder) -> ClientResult<Order> {
        self.create_calls.lock().unwrap().push(draft.clone());
        if self.create_fails.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("order rejected".to_string()));
        }
        Ok(Order {
            id: "o1".to_string(),
            record_id: "orders:o1".to_string(),
            status: OrderStatus::Pending,
            created_at: draft.created_at,
            delivered_at: None,
            items: draft.items.clone(),
            total: draft.total,
            delivery_fee: draft.delivery_fee,
            method: draft.method,
            rider: None,
            pings: vec![],
            email: draft.email.clone(),
            address: draft.address.clone(),
            phone: draft.phone.clone(),
        })
    }
}

struct Fixture {
    _dir: TempDir,
    store: LocalStore,
    cart: CartManager,
    backend: Arc<RecordingBackend>,
    flow: CheckoutFlow,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    store
        .save_profile(&UserProfile::new(EMAIL, "12 Allen Ave"))
        .unwrap();

    let (server_tx, _) = broadcast::channel(64);
    let (client_tx, _) = broadcast::channel(64);
    let channel = EventChannelClient::memory(&server_tx, &client_tx);
    let identity = SessionIdentity::new();

    // Backend base URL points nowhere; checkout exercises the mocked
    // payment seam, and the post-checkout resync is tolerant of an
    // unreachable API.
    let api = ApiClient::new(&ClientConfig::default());
    let identity_manager =
        IdentityManager::load(store.clone(), api, channel.clone(), identity.clone());
    let cart = CartManager::load(store.clone(), channel, identity);

    let backend = Arc::new(RecordingBackend::default());
    let flow = CheckoutFlow::new(
        backend.clone(),
        store.clone(),
        cart.clone(),
        identity_manager,
    );

    Fixture {
        _dir: dir,
        store,
        cart,
        backend,
        flow,
    }
}

fn cart_item(price: f64) -> CartItem {
    CartItem {
        line_id: shared::util::line_id(),
        product_id: "p1".to_string(),
        name: "Party Pack".to_string(),
        image: None,
        size: "LARGE".to_string(),
        price,
        extras: vec![],
        note: None,
        quantity: 1,
        category: "Rice".to_string(),
    }
}

#[tokio::test]
async fn test_checkout_happy_path() {
    let f = fixture();
    f.backend.verify_ok.store(true, Ordering::SeqCst);

    // One item at 9500 + delivery fee 500 = 10000, no promo applied
    f.cart.add(cart_item(9500.0)).await;
    let init = f.flow.begin(DeliveryMethod::Delivery).await.unwrap();
    assert_eq!(init.reference, REFERENCE);

    {
        let init_calls = f.backend.init_calls.lock().unwrap();
        assert_eq!(init_calls[0].amount, 10_000.0);
        assert_eq!(init_calls[0].email, EMAIL);
    }

    let draft = f.store.load_pending_order().unwrap();
    assert_eq!(draft.reference, REFERENCE);
    assert_eq!(draft.total, 10_000.0);

    let order = f.flow.complete(REFERENCE).await.unwrap();
    assert_eq!(order.total, 10_000.0);

    // Order-create received the exact stored draft
    assert_eq!(f.backend.create_calls.lock().unwrap()[0], draft);
    assert_eq!(f.backend.verify_calls.lock().unwrap()[0], REFERENCE);

    // Cart emptied, draft removed
    assert!(f.cart.is_empty());
    assert!(f.store.load_pending_order().is_none());
}

#[tokio::test]
async fn test_failed_verification_discards_draft() {
    let f = fixture();
    f.backend.verify_ok.store(false, Ordering::SeqCst);

    f.cart.add(cart_item(2000.0)).await;
    f.flow.begin(DeliveryMethod::Delivery).await.unwrap();
    assert!(f.store.load_pending_order().is_some());

    let err = f.flow.complete(REFERENCE).await.unwrap_err();
    assert!(matches!(err, CheckoutError::VerificationFailed));

    // The stale draft is gone, so a retry cannot double-submit
    assert!(f.store.load_pending_order().is_none());
    assert!(f.backend.create_calls.lock().unwrap().is_empty());
    // The cart survives for another attempt
    assert!(!f.cart.is_empty());
}

#[tokio::test]
async fn test_failed_order_creation_discards_draft() {
    let f = fixture();
    f.backend.verify_ok.store(true, Ordering::SeqCst);
    f.backend.create_fails.store(true, Ordering::SeqCst);

    f.cart.add(cart_item(2000.0)).await;
    f.flow.begin(DeliveryMethod::Delivery).await.unwrap();

    let err = f.flow.complete(REFERENCE).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderCreate(_)));
    assert!(f.store.load_pending_order().is_none());
    assert!(!f.cart.is_empty());
}

#[tokio::test]
async fn test_begin_requires_items_and_profile() {
    let f = fixture();
    let err = f.flow.begin(DeliveryMethod::Delivery).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert!(f.backend.init_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_pickup_skips_delivery_fee() {
    let f = fixture();
    f.backend.verify_ok.store(true, Ordering::SeqCst);

    f.cart.add(cart_item(3000.0)).await;
    f.flow.begin(DeliveryMethod::Pickup).await.unwrap();

    assert_eq!(f.backend.init_calls.lock().unwrap()[0].amount, 3000.0);
    assert_eq!(f.store.load_pending_order().unwrap().delivery_fee, 0.0);
}

#[tokio::test]
async fn test_repeat_begin_replaces_draft() {
    let f = fixture();
    f.cart.add(cart_item(2000.0)).await;

    f.flow.begin(DeliveryMethod::Delivery).await.unwrap();
    f.cart.add(cart_item(1000.0)).await;
    f.flow.begin(DeliveryMethod::Delivery).await.unwrap();

    let draft = f.store.load_pending_order().unwrap();
    assert_eq!(draft.items.len(), 2);
    assert_eq!(draft.total, 3500.0);
}
