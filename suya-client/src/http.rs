//! HTTP client for the ordering backend REST API
//!
//! Thin typed wrappers over the backend operations the clients
//! consume. The backend owns all business logic; these calls only
//! shuttle DTOs.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{ClientConfig, ClientError, ClientResult};
use shared::client::{
    ApiResponse, AssignRiderRequest, PaymentInitRequest, PaymentInitResponse,
    PaymentVerifyResponse, PromoValidationRequest, PushSubscription, StatusUpdateRequest,
    UploadResponse, VapidKeyResponse, VerifyAccountRequest, VerifyAccountResponse,
};
use shared::models::{
    AppliedPromo, Bank, Order, PendingOrder, Product, ProductCreate, ProductUpdate, PromoCode,
    Rating, Rider, RiderCreate, RiderUpdate, SettingsUpdate, StoreSettings, Withdrawal,
    WithdrawRequest,
};

/// HTTP client for making network requests to the ordering backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client from configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_header() {
            Some(auth) => request.header(reqwest::header::AUTHORIZATION, auth),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.apply_auth(self.client.get(self.url(path)));
        Self::handle_response(request.send().await?).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let request = self.apply_auth(self.client.post(self.url(path)).json(body));
        Self::handle_response(request.send().await?).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let request = self.apply_auth(self.client.put(self.url(path)).json(body));
        Self::handle_response(request.send().await?).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.apply_auth(self.client.delete(self.url(path)));
        Self::handle_response(request.send().await?).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Internal(text)),
            };
        }

        response.json().await.map_err(Into::into)
    }

    fn data<T>(response: ApiResponse<T>) -> ClientResult<T> {
        response
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing response data".to_string()))
    }

    // ========== Catalog API ==========

    pub async fn fetch_products(&self) -> ClientResult<Vec<Product>> {
        Self::data(self.get::<ApiResponse<Vec<Product>>>("/api/products").await?)
    }

    pub async fn fetch_product(&self, id: &str) -> ClientResult<Product> {
        Self::data(
            self.get::<ApiResponse<Product>>(&format!("/api/products/{}", id))
                .await?,
        )
    }

    pub async fn create_product(&self, data: &ProductCreate) -> ClientResult<Product> {
        Self::data(self.post::<ApiResponse<Product>, _>("/api/products", data).await?)
    }

    pub async fn update_product(&self, id: &str, data: &ProductUpdate) -> ClientResult<Product> {
        Self::data(
            self.put::<ApiResponse<Product>, _>(&format!("/api/products/{}", id), data)
                .await?,
        )
    }

    pub async fn delete_product(&self, id: &str) -> ClientResult<bool> {
        Self::data(
            self.delete::<ApiResponse<bool>>(&format!("/api/products/{}", id))
                .await?,
        )
    }

    /// Upload an image (multipart), returning its public URL.
    pub async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> ClientResult<UploadResponse> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self.apply_auth(self.client.post(self.url("/api/uploads")).multipart(form));
        let response: ApiResponse<UploadResponse> =
            Self::handle_response(request.send().await?).await?;
        Self::data(response)
    }

    // ========== Order API ==========

    /// Create an order from a verified pending draft.
    pub async fn create_order(&self, draft: &PendingOrder) -> ClientResult<Order> {
        Self::data(self.post::<ApiResponse<Order>, _>("/api/orders", draft).await?)
    }

    /// Fetch the full order history for one identity.
    pub async fn fetch_orders(&self, email: &str) -> ClientResult<Vec<Order>> {
        Self::data(
            self.get::<ApiResponse<Vec<Order>>>(&format!("/api/orders/user/{}", email))
                .await?,
        )
    }

    /// Fetch all orders (admin).
    pub async fn fetch_all_orders(&self) -> ClientResult<Vec<Order>> {
        Self::data(self.get::<ApiResponse<Vec<Order>>>("/api/orders").await?)
    }

    pub async fn update_order_status(
        &self,
        record_id: &str,
        update: &StatusUpdateRequest,
    ) -> ClientResult<Order> {
        Self::data(
            self.put::<ApiResponse<Order>, _>(&format!("/api/orders/{}/status", record_id), update)
                .await?,
        )
    }

    pub async fn assign_rider(&self, record_id: &str, rider_id: &str) -> ClientResult<Order> {
        let body = AssignRiderRequest {
            rider_id: rider_id.to_string(),
        };
        Self::data(
            self.put::<ApiResponse<Order>, _>(&format!("/api/orders/{}/assign", record_id), &body)
                .await?,
        )
    }

    // ========== Payment API ==========

    /// Initialize a payment, returning the provider redirect URL and
    /// the verification reference.
    pub async fn initialize_payment(
        &self,
        request: &PaymentInitRequest,
    ) -> ClientResult<PaymentInitResponse> {
        Self::data(
            self.post::<ApiResponse<PaymentInitResponse>, _>("/api/payments/initialize", request)
                .await?,
        )
    }

    /// Verify a payment reference after the provider redirect.
    pub async fn verify_payment(&self, reference: &str) -> ClientResult<bool> {
        let data: PaymentVerifyResponse = Self::data(
            self.get::<ApiResponse<PaymentVerifyResponse>>(&format!(
                "/api/payments/verify/{}",
                reference
            ))
            .await?,
        )?;
        Ok(data.verified)
    }

    // ========== Rider API ==========

    pub async fn fetch_riders(&self) -> ClientResult<Vec<Rider>> {
        Self::data(self.get::<ApiResponse<Vec<Rider>>>("/api/riders").await?)
    }

    pub async fn create_rider(&self, data: &RiderCreate) -> ClientResult<Rider> {
        Self::data(self.post::<ApiResponse<Rider>, _>("/api/riders", data).await?)
    }

    pub async fn update_rider(&self, id: &str, data: &RiderUpdate) -> ClientResult<Rider> {
        Self::data(
            self.put::<ApiResponse<Rider>, _>(&format!("/api/riders/{}", id), data)
                .await?,
        )
    }

    pub async fn delete_rider(&self, id: &str) -> ClientResult<bool> {
        Self::data(
            self.delete::<ApiResponse<bool>>(&format!("/api/riders/{}", id))
                .await?,
        )
    }

    // ========== Settings API ==========

    pub async fn fetch_settings(&self) -> ClientResult<StoreSettings> {
        Self::data(self.get::<ApiResponse<StoreSettings>>("/api/settings").await?)
    }

    pub async fn update_settings(&self, data: &SettingsUpdate) -> ClientResult<StoreSettings> {
        Self::data(self.put::<ApiResponse<StoreSettings>, _>("/api/settings", data).await?)
    }

    // ========== Push API ==========

    pub async fn fetch_vapid_key(&self) -> ClientResult<String> {
        let data: VapidKeyResponse =
            Self::data(self.get::<ApiResponse<VapidKeyResponse>>("/api/push/vapid").await?)?;
        Ok(data.public_key)
    }

    pub async fn register_push_subscription(
        &self,
        subscription: &PushSubscription,
    ) -> ClientResult<()> {
        let _: ApiResponse<serde_json::Value> =
            self.post("/api/push/subscribe", subscription).await?;
        Ok(())
    }

    // ========== Rating API ==========

    pub async fn submit_rating(&self, rating: &Rating) -> ClientResult<Rating> {
        Self::data(self.post::<ApiResponse<Rating>, _>("/api/ratings", rating).await?)
    }

    pub async fn fetch_ratings(&self, product_id: &str) -> ClientResult<Vec<Rating>> {
        Self::data(
            self.get::<ApiResponse<Vec<Rating>>>(&format!("/api/ratings/{}", product_id))
                .await?,
        )
    }

    // ========== Promo API ==========

    pub async fn fetch_promos(&self) -> ClientResult<Vec<PromoCode>> {
        Self::data(self.get::<ApiResponse<Vec<PromoCode>>>("/api/promos").await?)
    }

    pub async fn create_promo(&self, promo: &PromoCode) -> ClientResult<PromoCode> {
        Self::data(self.post::<ApiResponse<PromoCode>, _>("/api/promos", promo).await?)
    }

    pub async fn update_promo(&self, id: &str, promo: &PromoCode) -> ClientResult<PromoCode> {
        Self::data(
            self.put::<ApiResponse<PromoCode>, _>(&format!("/api/promos/{}", id), promo)
                .await?,
        )
    }

    pub async fn delete_promo(&self, id: &str) -> ClientResult<bool> {
        Self::data(
            self.delete::<ApiResponse<bool>>(&format!("/api/promos/{}", id))
                .await?,
        )
    }

    /// Validate a promo code against the current cart contents.
    pub async fn validate_promo(
        &self,
        request: &PromoValidationRequest,
    ) -> ClientResult<AppliedPromo> {
        Self::data(
            self.post::<ApiResponse<AppliedPromo>, _>("/api/promos/validate", request)
                .await?,
        )
    }

    // ========== Payout API ==========

    pub async fn fetch_banks(&self) -> ClientResult<Vec<Bank>> {
        Self::data(self.get::<ApiResponse<Vec<Bank>>>("/api/banks").await?)
    }

    pub async fn verify_payout_account(
        &self,
        request: &VerifyAccountRequest,
    ) -> ClientResult<VerifyAccountResponse> {
        Self::data(
            self.post::<ApiResponse<VerifyAccountResponse>, _>("/api/payouts/verify-account", request)
                .await?,
        )
    }

    pub async fn initiate_withdrawal(&self, request: &WithdrawRequest) -> ClientResult<Withdrawal> {
        Self::data(
            self.post::<ApiResponse<Withdrawal>, _>("/api/payouts/withdraw", request)
                .await?,
        )
    }

    pub async fn fetch_withdrawals(&self, rider_id: &str) -> ClientResult<Vec<Withdrawal>> {
        Self::data(
            self.get::<ApiResponse<Vec<Withdrawal>>>(&format!(
                "/api/payouts/withdrawals/{}",
                rider_id
            ))
            .await?,
        )
    }
}
