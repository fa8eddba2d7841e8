//! Request and response envelopes for the storefront JSON API.
//!
//! Wire names are camelCase; domain types live in [`crate::models`] and are
//! reused here wherever the wire document matches them one-to-one.

use serde::{Deserialize, Serialize};

use quitanda_core::{PaymentMethod, Price};

use crate::models::{Address, CartLine, Category, Order, Product, User};

// =============================================================================
// Auth
// =============================================================================

/// `POST /auth/login` request body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginPayload<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /auth/register` request body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Successful login/register response: the user plus a bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Error body the API attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

// =============================================================================
// Orders
// =============================================================================

/// `POST /orders` request body: the cart snapshot taken at submission time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(rename = "items")]
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub payment_method: PaymentMethod,
    pub delivery_address: Address,
}

/// `POST /orders` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: Order,
}

/// One page of the caller's order history (`GET /orders/my-orders`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersPage {
    pub orders: Vec<Order>,
    pub total: u32,
    pub page: u32,
    pub total_pages: u32,
}

// =============================================================================
// Catalog
// =============================================================================

/// One page of the catalog (`GET /products`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u32,
    pub page: u32,
    pub total_pages: u32,
}

/// An unpaged product list (`GET /products/search`, `/products/category/..`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: u32,
}

/// `GET /products/featured` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedEnvelope {
    pub products: Vec<Product>,
}

/// `GET /categories` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesEnvelope {
    pub categories: Vec<Category>,
}
