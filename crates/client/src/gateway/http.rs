//! HTTP implementation of the storefront API gateway.
//!
//! Plain JSON over `reqwest`. Catalog reads are cached with `moka`
//! (5-minute TTL); auth and order calls always hit the network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use quitanda_core::{Email, OrderId, ProductId};

use crate::config::ClientConfig;
use crate::gateway::types::{
    AuthResponse, CategoriesEnvelope, ErrorBody, FeaturedEnvelope, LoginPayload, OrderDraft,
    OrderEnvelope, OrdersPage, ProductList, ProductPage, RegisterPayload,
};
use crate::gateway::{ApiError, AuthFailure, RemoteGateway};
use crate::models::{Category, Order, Product, User};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Cached catalog value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Page(ProductPage),
    List(ProductList),
    Featured(Vec<Product>),
    Categories(Vec<Category>),
}

/// Client for the storefront JSON API.
///
/// Cheap to clone; all clones share the HTTP connection pool and the
/// catalog cache.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<HttpGatewayInner>,
}

struct HttpGatewayInner {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    cache: Cache<String, CacheValue>,
}

impl HttpGateway {
    /// Create a new gateway from configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(HttpGatewayInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                timeout: config.request_timeout,
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn bearer(request: reqwest::RequestBuilder, token: &SecretString) -> reqwest::RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
    }

    /// Send a request and decode the JSON response.
    ///
    /// Non-2xx statuses are classified into [`ApiError`] here, once, for
    /// every endpoint.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.timeout(self.inner.timeout).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = %status, "storefront API returned error status");
            return Err(classify_error(status, &body));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "failed to parse storefront API response"
                );
                Err(ApiError::Decode(e))
            }
        }
    }

    // =========================================================================
    // Catalog Methods (cached)
    // =========================================================================

    /// Get a page of the product catalog, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
        category: Option<&str>,
    ) -> Result<ProductPage, ApiError> {
        let cache_key = format!(
            "products:{}:{}:{}",
            page.unwrap_or(1),
            limit.unwrap_or(0),
            category.unwrap_or("")
        );

        if let Some(CacheValue::Page(cached)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(cached);
        }

        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }

        let fetched: ProductPage = self
            .send(self.inner.client.get(self.url("/products")).query(&query))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Page(fetched.clone()))
            .await;

        Ok(fetched)
    }

    /// Search products by free text. Not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<ProductList, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url("/products/search"))
                .query(&[("q", query)]),
        )
        .await
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(cached)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*cached);
        }

        let product: Product = self
            .send(
                self.inner
                    .client
                    .get(self.url(&format!("/products/{product_id}"))),
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get all products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products_by_category(&self, slug: &str) -> Result<ProductList, ApiError> {
        let cache_key = format!("category:{slug}");

        if let Some(CacheValue::List(cached)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category products");
            return Ok(cached);
        }

        let list: ProductList = self
            .send(
                self.inner
                    .client
                    .get(self.url(&format!("/products/category/{slug}"))),
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::List(list.clone()))
            .await;

        Ok(list)
    }

    /// Get the featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        let cache_key = "featured".to_string();

        if let Some(CacheValue::Featured(cached)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for featured products");
            return Ok(cached);
        }

        let envelope: FeaturedEnvelope = self
            .send(self.inner.client.get(self.url("/products/featured")))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Featured(envelope.products.clone()))
            .await;

        Ok(envelope.products)
    }

    /// Get all product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(cached)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(cached);
        }

        let envelope: CategoriesEnvelope = self
            .send(self.inner.client.get(self.url("/categories")))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(envelope.categories.clone()))
            .await;

        Ok(envelope.categories)
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Order History (authenticated, not cached)
    // =========================================================================

    /// Get a page of the caller's order history.
    ///
    /// # Errors
    ///
    /// Returns `Auth(SessionExpired)` for a dead token, or a transport/server
    /// error.
    #[instrument(skip(self, token))]
    pub async fn my_orders(
        &self,
        token: &SecretString,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<OrdersPage, ApiError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        self.send(Self::bearer(
            self.inner
                .client
                .get(self.url("/orders/my-orders"))
                .query(&query),
            token,
        ))
        .await
    }

    /// Get one of the caller's orders by id.
    ///
    /// # Errors
    ///
    /// Returns `Auth(SessionExpired)` for a dead token, or a transport/server
    /// error.
    #[instrument(skip(self, token), fields(order_id = %order_id))]
    pub async fn order(&self, token: &SecretString, order_id: OrderId) -> Result<Order, ApiError> {
        self.send(Self::bearer(
            self.inner
                .client
                .get(self.url(&format!("/orders/{order_id}"))),
            token,
        ))
        .await
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &str) -> Result<AuthResponse, ApiError> {
        let payload = LoginPayload {
            email: email.as_str(),
            password,
        };

        self.send(self.inner.client.post(self.url("/auth/login")).json(&payload))
            .await
            .map_err(|e| match e {
                // 401 at login means the credentials were wrong, not that an
                // existing session died.
                ApiError::Auth(AuthFailure::SessionExpired) => {
                    ApiError::Auth(AuthFailure::InvalidCredentials)
                }
                other => other,
            })
    }

    #[instrument(skip(self, payload), fields(email = %payload.email))]
    async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        self.send(
            self.inner
                .client
                .post(self.url("/auth/register"))
                .json(payload),
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn logout(&self, token: &SecretString) -> Result<(), ApiError> {
        let request = Self::bearer(self.inner.client.post(self.url("/auth/logout")), token);
        let response = request.timeout(self.inner.timeout).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await?;
            return Err(classify_error(status, &body));
        }

        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn current_user(&self, token: &SecretString) -> Result<User, ApiError> {
        self.send(Self::bearer(self.inner.client.get(self.url("/auth/me")), token))
            .await
    }

    #[instrument(skip(self, token, draft), fields(total = %draft.total))]
    async fn create_order(
        &self,
        token: &SecretString,
        draft: &OrderDraft,
    ) -> Result<Order, ApiError> {
        let envelope: OrderEnvelope = self
            .send(Self::bearer(
                self.inner.client.post(self.url("/orders")).json(draft),
                token,
            ))
            .await?;

        Ok(envelope.order)
    }
}

/// Map a non-2xx response to the error taxonomy.
///
/// 401 is an authentication failure (expired/invalid token; login remaps it
/// to invalid credentials), 409 is a registration conflict, everything else
/// carries the server's message through verbatim.
fn classify_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error);

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Auth(AuthFailure::SessionExpired),
        StatusCode::CONFLICT => ApiError::Auth(AuthFailure::EmailAlreadyRegistered),
        _ => ApiError::Server(message.unwrap_or_else(|| format!("HTTP {status}"))),
    }
}
