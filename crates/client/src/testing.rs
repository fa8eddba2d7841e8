//! Test doubles and fixtures shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use tokio::sync::Semaphore;

use quitanda_core::{Email, OrderId, OrderStatus, Price, ProductId, UserId};

use crate::gateway::types::{AuthResponse, OrderDraft, RegisterPayload};
use crate::gateway::{ApiError, RemoteGateway};
use crate::models::{Address, Order, Product, User};

// =============================================================================
// Fixtures
// =============================================================================

pub(crate) fn product(id: i32, name: &str, centavos: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: format!("{name}, direto da quitanda"),
        price: Price::from_centavos(centavos),
        old_price: None,
        discount: None,
        category: "mercearia".to_string(),
        image_url: format!("/img/{id}.jpg"),
        stock: 100,
        is_active: true,
    }
}

pub(crate) fn user(id: i32, name: &str, email: &str) -> User {
    User {
        id: UserId::new(id),
        name: name.to_string(),
        email: Email::parse(email).unwrap(),
        phone: None,
    }
}

pub(crate) fn auth_response(id: i32, name: &str, email: &str, token: &str) -> AuthResponse {
    AuthResponse {
        user: user(id, name, email),
        token: token.to_string(),
    }
}

pub(crate) fn address() -> Address {
    Address {
        street: "Rua das Laranjeiras".to_string(),
        number: "123".to_string(),
        complement: None,
        neighborhood: "Centro".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
        zip_code: "01000-000".to_string(),
    }
}

/// The order the mock server would mint for a submitted draft.
pub(crate) fn order_for(draft: &OrderDraft, id: i32) -> Order {
    Order {
        id: OrderId::new(id),
        lines: draft.lines.clone(),
        total: draft.total,
        payment_method: draft.payment_method,
        delivery_address: draft.delivery_address.clone(),
        status: OrderStatus::Pending,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

// =============================================================================
// MockGateway
// =============================================================================

#[derive(Clone)]
struct OrderGate {
    entered: Arc<Semaphore>,
    proceed: Arc<Semaphore>,
}

/// Scripted in-memory [`RemoteGateway`].
///
/// Each `expect_*` call queues one response; calls with an empty queue panic
/// (except `logout`, which defaults to success, matching how rarely tests
/// care about it). `echo_create_order` makes order submission succeed by
/// minting an order from the submitted draft, the way the real server does.
#[derive(Default)]
pub(crate) struct MockGateway {
    login_results: Mutex<VecDeque<Result<AuthResponse, ApiError>>>,
    register_results: Mutex<VecDeque<Result<AuthResponse, ApiError>>>,
    logout_results: Mutex<VecDeque<Result<(), ApiError>>>,
    current_user_results: Mutex<VecDeque<Result<User, ApiError>>>,
    create_order_results: Mutex<VecDeque<Result<Order, ApiError>>>,
    echo_orders: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
    drafts: Mutex<Vec<OrderDraft>>,
    order_gate: Mutex<Option<OrderGate>>,
}

impl MockGateway {
    pub fn expect_login(&self, result: Result<AuthResponse, ApiError>) {
        self.login_results.lock().unwrap().push_back(result);
    }

    pub fn expect_register(&self, result: Result<AuthResponse, ApiError>) {
        self.register_results.lock().unwrap().push_back(result);
    }

    pub fn expect_logout(&self, result: Result<(), ApiError>) {
        self.logout_results.lock().unwrap().push_back(result);
    }

    pub fn expect_current_user(&self, result: Result<User, ApiError>) {
        self.current_user_results.lock().unwrap().push_back(result);
    }

    pub fn expect_create_order(&self, result: Result<Order, ApiError>) {
        self.create_order_results.lock().unwrap().push_back(result);
    }

    /// Answer order submissions by echoing the draft back as order #1.
    pub fn echo_create_order(&self) {
        self.echo_orders.store(true, Ordering::SeqCst);
    }

    /// Gate order submissions so a test can interleave work mid-flight.
    ///
    /// Returns `(entered, proceed)`: `entered` gains a permit when a
    /// submission reaches the gateway; the call then waits for a permit on
    /// `proceed`.
    pub fn gate_orders(&self) -> (Arc<Semaphore>, Arc<Semaphore>) {
        let gate = OrderGate {
            entered: Arc::new(Semaphore::new(0)),
            proceed: Arc::new(Semaphore::new(0)),
        };
        let handles = (gate.entered.clone(), gate.proceed.clone());
        *self.order_gate.lock().unwrap() = Some(gate);
        handles
    }

    /// Names of the gateway calls made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Every order draft submitted so far.
    pub fn drafts(&self) -> Vec<OrderDraft> {
        self.drafts.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    async fn login(&self, _email: &Email, _password: &str) -> Result<AuthResponse, ApiError> {
        self.record("login");
        self.login_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected login call")
    }

    async fn register(&self, _payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        self.record("register");
        self.register_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected register call")
    }

    async fn logout(&self, _token: &SecretString) -> Result<(), ApiError> {
        self.record("logout");
        self.logout_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn current_user(&self, _token: &SecretString) -> Result<User, ApiError> {
        self.record("current_user");
        self.current_user_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected current_user call")
    }

    async fn create_order(
        &self,
        _token: &SecretString,
        draft: &OrderDraft,
    ) -> Result<Order, ApiError> {
        self.record("create_order");
        self.drafts.lock().unwrap().push(draft.clone());

        let gate = self.order_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.add_permits(1);
            if let Ok(permit) = gate.proceed.acquire().await {
                permit.forget();
            }
        }

        if let Some(result) = self.create_order_results.lock().unwrap().pop_front() {
            return result;
        }
        if self.echo_orders.load(Ordering::SeqCst) {
            return Ok(order_for(draft, 1));
        }
        panic!("unexpected create_order call")
    }
}
