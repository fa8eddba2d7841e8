//! Integration tests for Quitanda.
//!
//! Each test boots an in-process mock of the storefront API (`axum` on an
//! ephemeral port) and drives the real [`quitanda_client::HttpGateway`] and
//! stores against it, end to end: register/login/restore, cart + checkout,
//! and failure injection (server errors, revoked tokens, a dead server).
//!
//! # Test Categories
//!
//! - `session_lifecycle` - login, restore, logout, credential persistence
//! - `checkout_flow` - the full cart -> address -> payment -> order path
//! - `catalog` - cached catalog reads
//!
//! Run with `cargo test -p quitanda-integration-tests`.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)] // test-support crate; panics are test failures

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use quitanda_client::config::ClientConfig;

/// Initialize tracing output for tests (once per process).
///
/// Controlled by `RUST_LOG`; silent by default.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A credentials file path unique to one test, wiped before use.
#[must_use]
pub fn temp_credentials_path(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "quitanda-it-credentials-{}-{tag}.json",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

// =============================================================================
// Mock storefront API
// =============================================================================

#[derive(Debug, Clone)]
struct MockUser {
    id: i32,
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
}

impl MockUser {
    fn to_json(&self) -> Value {
        let mut user = json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
        });
        if let Some(phone) = &self.phone {
            user["phone"] = json!(phone);
        }
        user
    }
}

/// Shared state behind the mock API, inspectable from tests.
pub struct ApiState {
    users: Mutex<Vec<MockUser>>,
    tokens: Mutex<HashMap<String, i32>>,
    orders: Mutex<Vec<Value>>,
    next_user_id: AtomicI32,
    next_order_id: AtomicI32,
    next_token: AtomicI32,
    product_hits: AtomicUsize,
    order_failure: Mutex<Option<(u16, String)>>,
}

impl ApiState {
    fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            tokens: Mutex::new(HashMap::new()),
            orders: Mutex::new(Vec::new()),
            next_user_id: AtomicI32::new(1),
            next_order_id: AtomicI32::new(1),
            next_token: AtomicI32::new(1),
            product_hits: AtomicUsize::new(0),
            order_failure: Mutex::new(None),
        }
    }

    fn mint_token(&self, user_id: i32) -> String {
        let token = format!(
            "tok-{user_id}-{}",
            self.next_token.fetch_add(1, Ordering::SeqCst)
        );
        self.tokens.lock().unwrap().insert(token.clone(), user_id);
        token
    }

    fn user_for_token(&self, headers: &HeaderMap) -> Option<MockUser> {
        let token = bearer_token(headers)?;
        let user_id = *self.tokens.lock().unwrap().get(&token)?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
    }

    /// Make every order submission fail with this status and message until
    /// [`clear_order_failure`](Self::clear_order_failure).
    pub fn fail_orders_with(&self, status: u16, message: &str) {
        *self.order_failure.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Let order submissions succeed again.
    pub fn clear_order_failure(&self) {
        *self.order_failure.lock().unwrap() = None;
    }

    /// Drop every issued token, as if sessions expired server-side.
    pub fn revoke_all_tokens(&self) {
        self.tokens.lock().unwrap().clear();
    }

    /// Number of orders the mock accepted.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    /// The most recently accepted order document.
    #[must_use]
    pub fn last_order(&self) -> Option<Value> {
        self.orders.lock().unwrap().last().cloned()
    }

    /// How many times `GET /products` hit the server (cache misses).
    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.product_hits.load(Ordering::SeqCst)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Token inválido")
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
}

async fn register(State(state): State<Arc<ApiState>>, Json(body): Json<RegisterBody>) -> Response {
    let mut users = state.users.lock().unwrap();
    if users.iter().any(|u| u.email == body.email) {
        return error_response(StatusCode::CONFLICT, "Email já cadastrado");
    }

    let user = MockUser {
        id: state.next_user_id.fetch_add(1, Ordering::SeqCst),
        name: body.name,
        email: body.email,
        password: body.password,
        phone: body.phone,
    };
    users.push(user.clone());
    drop(users);

    let token = state.mint_token(user.id);
    Json(json!({ "user": user.to_json(), "token": token })).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<ApiState>>, Json(body): Json<LoginBody>) -> Response {
    let user = state
        .users
        .lock()
        .unwrap()
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .cloned();

    match user {
        Some(user) => {
            let token = state.mint_token(user.id);
            Json(json!({ "user": user.to_json(), "token": token })).into_response()
        }
        None => error_response(StatusCode::UNAUTHORIZED, "Email ou senha incorretos"),
    }
}

async fn logout(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Some(token) => {
            state.tokens.lock().unwrap().remove(&token);
            StatusCode::OK.into_response()
        }
        None => unauthorized(),
    }
}

async fn me(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    state.user_for_token(&headers).map_or_else(
        unauthorized,
        |user| Json(user.to_json()).into_response(),
    )
}

async fn create_order(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if state.user_for_token(&headers).is_none() {
        return unauthorized();
    }

    if let Some((status, message)) = state.order_failure.lock().unwrap().clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error_response(status, &message);
    }

    let order = json!({
        "id": state.next_order_id.fetch_add(1, Ordering::SeqCst),
        "items": body["items"],
        "total": body["total"],
        "paymentMethod": body["paymentMethod"],
        "deliveryAddress": body["deliveryAddress"],
        "status": "pending",
        "createdAt": Utc::now().to_rfc3339(),
    });
    state.orders.lock().unwrap().push(order.clone());

    Json(json!({ "order": order })).into_response()
}

async fn my_orders(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(_params): Query<HashMap<String, String>>,
) -> Response {
    if state.user_for_token(&headers).is_none() {
        return unauthorized();
    }

    let orders = state.orders.lock().unwrap().clone();
    let total = orders.len();
    Json(json!({
        "orders": orders,
        "total": total,
        "page": 1,
        "totalPages": 1,
    }))
    .into_response()
}

fn catalog_products() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "name": "Arroz agulhinha 5kg",
            "description": "Arroz tipo 1",
            "price": "10.00",
            "category": "mercearia",
            "imageUrl": "/img/arroz.jpg",
            "stock": 40,
            "isActive": true,
        }),
        json!({
            "id": 2,
            "name": "Feijão carioca 1kg",
            "description": "Feijão carioca",
            "price": "5.50",
            "oldPrice": "6.90",
            "discount": 20,
            "category": "mercearia",
            "imageUrl": "/img/feijao.jpg",
            "stock": 25,
            "isActive": true,
        }),
    ]
}

async fn products(
    State(state): State<Arc<ApiState>>,
    Query(_params): Query<HashMap<String, String>>,
) -> Response {
    state.product_hits.fetch_add(1, Ordering::SeqCst);
    let products = catalog_products();
    let total = products.len();
    Json(json!({
        "products": products,
        "total": total,
        "page": 1,
        "totalPages": 1,
    }))
    .into_response()
}

async fn search_products(Query(params): Query<HashMap<String, String>>) -> Response {
    let query = params.get("q").cloned().unwrap_or_default().to_lowercase();
    let products: Vec<Value> = catalog_products()
        .into_iter()
        .filter(|p| {
            p["name"]
                .as_str()
                .is_some_and(|name| name.to_lowercase().contains(&query))
        })
        .collect();
    let total = products.len();
    Json(json!({ "products": products, "total": total })).into_response()
}

async fn product_by_id(Path(id): Path<i32>) -> Response {
    catalog_products()
        .into_iter()
        .find(|p| p["id"] == json!(id))
        .map_or_else(
            || error_response(StatusCode::NOT_FOUND, "Produto não encontrado"),
            |product| Json(product).into_response(),
        )
}

async fn categories() -> Response {
    Json(json!({
        "categories": [
            { "id": 1, "name": "Mercearia", "slug": "mercearia" },
            { "id": 2, "name": "Hortifruti", "slug": "hortifruti" },
        ]
    }))
    .into_response()
}

// =============================================================================
// Server lifecycle
// =============================================================================

/// An in-process mock of the storefront API.
pub struct MockApi {
    /// Address the server is listening on.
    pub addr: SocketAddr,
    /// Inspectable server state.
    pub state: Arc<ApiState>,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Boot the mock API on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind (test environment failure).
    pub async fn start() -> Self {
        let state = Arc::new(ApiState::new());

        let api = Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .route("/auth/me", get(me))
            .route("/orders", post(create_order))
            .route("/orders/my-orders", get(my_orders))
            .route("/products", get(products))
            .route("/products/search", get(search_products))
            .route("/products/{id}", get(product_by_id))
            .route("/categories", get(categories))
            .with_state(state.clone());
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock API listener");
        let addr = listener.local_addr().expect("mock API has no local addr");

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL of the API (`http://127.0.0.1:<port>/api`).
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).expect("mock API base URL")
    }

    /// A client configuration pointing at this mock, persisting credentials
    /// to a per-test temp file.
    #[must_use]
    pub fn client_config(&self, tag: &str) -> ClientConfig {
        let mut config = ClientConfig::with_base_url(self.base_url());
        config.credentials_path = temp_credentials_path(tag);
        config
    }

    /// Stop the server, making every further request a connection error.
    pub fn shut_down(&self) {
        self.server.abort();
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}
