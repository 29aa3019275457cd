//! Commerce REST API client.
//!
//! # Architecture
//!
//! - [`StoreApi`] is the abstract remote boundary; the state managers depend
//!   on it, never on `reqwest` directly, so tests can substitute an in-memory
//!   implementation.
//! - [`ApiClient`] is the production implementation: one `reqwest::Client`
//!   behind an `Arc`, bearer credential per request, and in-memory caching of
//!   catalog reads via `moka` (5 minute TTL).
//! - A `401` from any authorized call publishes a credential-invalidation
//!   event on a watch channel. The application shell subscribes and routes
//!   the user back to the login surface; the session purges identity and
//!   credential together.

pub mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shopcart_core::{OrderId, ProductId};
use tokio::sync::watch;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::storage::Credential;

use moka::future::Cache;

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Abstract boundary to the remote commerce service.
///
/// Mirrors the REST surface one-to-one; each method is a single round trip
/// with no retries. Authorized calls take the credential explicitly so the
/// client itself stays stateless about sessions.
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// `GET /health` - liveness probe.
    async fn health(&self) -> Result<HealthStatus, ApiError>;

    /// `POST /auth/login`.
    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ApiError>;

    /// `POST /auth/register`.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSuccess, ApiError>;

    /// `GET /auth/me` - validate the credential and fetch the identity.
    async fn me(&self, credential: &Credential) -> Result<User, ApiError>;

    /// `PUT /auth/profile`.
    async fn update_profile(
        &self,
        credential: &Credential,
        patch: &ProfilePatch,
    ) -> Result<User, ApiError>;

    /// `GET /cart`.
    async fn cart(&self, credential: &Credential) -> Result<Cart, ApiError>;

    /// `POST /cart/add`.
    async fn add_to_cart(
        &self,
        credential: &Credential,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError>;

    /// `PUT /cart/update`.
    async fn update_cart_item(
        &self,
        credential: &Credential,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError>;

    /// `DELETE /cart/remove/{productId}`.
    async fn remove_from_cart(
        &self,
        credential: &Credential,
        product_id: &ProductId,
    ) -> Result<Cart, ApiError>;

    /// `DELETE /cart/clear`.
    async fn clear_cart(&self, credential: &Credential) -> Result<(), ApiError>;

    /// `POST /orders`.
    async fn place_order(
        &self,
        credential: &Credential,
        order: &NewOrder,
    ) -> Result<Order, ApiError>;

    /// `GET /orders/my-orders`.
    async fn my_orders(&self, credential: &Credential) -> Result<Vec<Order>, ApiError>;

    /// `GET /orders/{id}`.
    async fn order(&self, credential: &Credential, id: &OrderId) -> Result<Order, ApiError>;

    /// `GET /products`.
    async fn products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError>;

    /// `GET /products/{id}`.
    async fn product(&self, id: &ProductId) -> Result<Product, ApiError>;

    /// `GET /products/meta/categories`.
    async fn categories(&self) -> Result<Vec<String>, ApiError>;

    /// `GET /products/meta/brands`.
    async fn brands(&self) -> Result<Vec<String>, ApiError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire envelopes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct AuthEnvelope {
    user: User,
    token: String,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Debug, Deserialize)]
struct CartEnvelope {
    cart: Cart,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    order: Order,
}

#[derive(Debug, Deserialize)]
struct OrdersEnvelope {
    orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    product: Product,
}

#[derive(Debug, Deserialize)]
struct CategoriesEnvelope {
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BrandsEnvelope {
    brands: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ApiClient
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    Page(Box<ProductPage>),
    Names(Vec<String>),
}

/// Production [`StoreApi`] implementation over HTTP.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    invalidation_tx: watch::Sender<u64>,
    catalog_cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shopcart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let catalog_cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        let (invalidation_tx, _) = watch::channel(0);

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                invalidation_tx,
                catalog_cache,
            }),
        })
    }

    /// Subscribe to credential-invalidation events.
    ///
    /// The value is a generation counter bumped on every `401` response.
    /// The application shell should watch this and return the user to the
    /// login surface.
    #[must_use]
    pub fn subscribe_invalidations(&self) -> watch::Receiver<u64> {
        self.inner.invalidation_tx.subscribe()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        // Url::join treats the base path as a directory only with a trailing
        // slash, so splice the path segments manually.
        let mut url = self.inner.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::Validation(format!("base URL cannot be a base: {}", self.inner.base_url)))?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        credential: Option<&Credential>,
    ) -> RequestBuilder {
        let mut builder = self.inner.client.request(method, url);
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.expose());
        }
        builder
    }

    /// Send a request and decode the JSON body.
    ///
    /// A `401` bumps the invalidation generation before returning
    /// [`ApiError::Unauthorized`]. Other non-success statuses are mapped to
    /// [`ApiError::Api`] with the message extracted from the `{"error"}`
    /// envelope when present.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.inner.invalidation_tx.send_modify(|generation| *generation += 1);
            return Err(ApiError::Unauthorized);
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or_else(|_| format!("HTTP {status}"), |b| b.error);
            tracing::warn!(status = %status, message = %message, "API request failed");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Option<&Credential>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::GET, url, credential)).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        credential: Option<&Credential>,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.request(method, url, credential).json(body))
            .await
    }

    async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::DELETE, url, Some(credential)))
            .await
    }
}

#[async_trait]
impl StoreApi for ApiClient {
    #[instrument(skip(self))]
    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("health", None).await
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let envelope: AuthEnvelope = self
            .send_json(Method::POST, "auth/login", None, &body)
            .await?;
        Ok(AuthSuccess {
            user: envelope.user,
            credential: Credential::new(envelope.token),
        })
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSuccess, ApiError> {
        let body = serde_json::json!({ "name": name, "email": email, "password": password });
        let envelope: AuthEnvelope = self
            .send_json(Method::POST, "auth/register", None, &body)
            .await?;
        Ok(AuthSuccess {
            user: envelope.user,
            credential: Credential::new(envelope.token),
        })
    }

    #[instrument(skip_all)]
    async fn me(&self, credential: &Credential) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self.get("auth/me", Some(credential)).await?;
        Ok(envelope.user)
    }

    #[instrument(skip_all)]
    async fn update_profile(
        &self,
        credential: &Credential,
        patch: &ProfilePatch,
    ) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self
            .send_json(Method::PUT, "auth/profile", Some(credential), patch)
            .await?;
        Ok(envelope.user)
    }

    #[instrument(skip_all)]
    async fn cart(&self, credential: &Credential) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self.get("cart", Some(credential)).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self, credential), fields(product_id = %product_id, quantity))]
    async fn add_to_cart(
        &self,
        credential: &Credential,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let body = serde_json::json!({ "productId": product_id, "quantity": quantity });
        let envelope: CartEnvelope = self
            .send_json(Method::POST, "cart/add", Some(credential), &body)
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self, credential), fields(product_id = %product_id, quantity))]
    async fn update_cart_item(
        &self,
        credential: &Credential,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let body = serde_json::json!({ "productId": product_id, "quantity": quantity });
        let envelope: CartEnvelope = self
            .send_json(Method::PUT, "cart/update", Some(credential), &body)
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self, credential), fields(product_id = %product_id))]
    async fn remove_from_cart(
        &self,
        credential: &Credential,
        product_id: &ProductId,
    ) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self
            .delete(&format!("cart/remove/{product_id}"), credential)
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip_all)]
    async fn clear_cart(&self, credential: &Credential) -> Result<(), ApiError> {
        // The clear endpoint returns no cart; discard the body.
        let _: serde_json::Value = self.delete("cart/clear", credential).await?;
        Ok(())
    }

    #[instrument(skip(self, credential, order))]
    async fn place_order(
        &self,
        credential: &Credential,
        order: &NewOrder,
    ) -> Result<Order, ApiError> {
        let envelope: OrderEnvelope = self
            .send_json(Method::POST, "orders", Some(credential), order)
            .await?;
        Ok(envelope.order)
    }

    #[instrument(skip_all)]
    async fn my_orders(&self, credential: &Credential) -> Result<Vec<Order>, ApiError> {
        let envelope: OrdersEnvelope = self.get("orders/my-orders", Some(credential)).await?;
        Ok(envelope.orders)
    }

    #[instrument(skip(self, credential), fields(order_id = %id))]
    async fn order(&self, credential: &Credential, id: &OrderId) -> Result<Order, ApiError> {
        let envelope: OrderEnvelope = self.get(&format!("orders/{id}"), Some(credential)).await?;
        Ok(envelope.order)
    }

    #[instrument(skip(self, query))]
    async fn products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let mut url = self.endpoint("products")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_pairs() {
                pairs.append_pair(key, &value);
            }
        }

        let cache_key = format!("products:{}", url.query().unwrap_or_default());
        if let Some(CacheValue::Page(page)) = self.inner.catalog_cache.get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(*page);
        }

        let page: ProductPage = self.send(self.request(Method::GET, url, None)).await?;
        self.inner
            .catalog_cache
            .insert(cache_key, CacheValue::Page(Box::new(page.clone())))
            .await;
        Ok(page)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.inner.catalog_cache.get(&cache_key).await
        {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let envelope: ProductEnvelope = self.get(&format!("products/{id}"), None).await?;
        self.inner
            .catalog_cache
            .insert(cache_key, CacheValue::Product(Box::new(envelope.product.clone())))
            .await;
        Ok(envelope.product)
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let cache_key = "categories".to_string();
        if let Some(CacheValue::Names(names)) = self.inner.catalog_cache.get(&cache_key).await {
            return Ok(names);
        }

        let envelope: CategoriesEnvelope = self.get("products/meta/categories", None).await?;
        self.inner
            .catalog_cache
            .insert(cache_key, CacheValue::Names(envelope.categories.clone()))
            .await;
        Ok(envelope.categories)
    }

    #[instrument(skip(self))]
    async fn brands(&self) -> Result<Vec<String>, ApiError> {
        let cache_key = "brands".to_string();
        if let Some(CacheValue::Names(names)) = self.inner.catalog_cache.get(&cache_key).await {
            return Ok(names);
        }

        let envelope: BrandsEnvelope = self.get("products/meta/brands", None).await?;
        self.inner
            .catalog_cache
            .insert(cache_key, CacheValue::Names(envelope.brands.clone()))
            .await;
        Ok(envelope.brands)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig {
            base_url: Url::parse(base).unwrap(),
            credential_path: std::path::PathBuf::from("/tmp/unused"),
            timeout: Duration::from_secs(5),
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_path() {
        let client = client("https://api.example.com/api");
        let url = client.endpoint("auth/me").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/auth/me");
    }

    #[test]
    fn test_endpoint_with_trailing_slash_base() {
        let client = client("https://api.example.com/api/");
        let url = client.endpoint("cart/remove/p1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/cart/remove/p1");
    }

    #[test]
    fn test_error_envelope_extraction() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"Product is out of stock"}"#).unwrap();
        assert_eq!(body.error, "Product is out of stock");
    }

    #[test]
    fn test_invalidation_subscription_starts_at_zero() {
        let client = client("https://api.example.com/api");
        let rx = client.subscribe_invalidations();
        assert_eq!(*rx.borrow(), 0);
    }
}
