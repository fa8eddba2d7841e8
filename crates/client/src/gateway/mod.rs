//! Remote storefront API boundary.
//!
//! # Architecture
//!
//! - The state core (session, checkout) talks to the remote side exclusively
//!   through the [`RemoteGateway`] trait, so tests can substitute the backend.
//! - [`HttpGateway`] is the production implementation over the storefront's
//!   JSON API (`reqwest`, bearer-token auth).
//! - Transport and status-code decoding happen ONCE here: everything past
//!   this module sees [`ApiError`], never a raw response shape.
//! - Read-only catalog fetches are cached in-memory via `moka` (5-minute
//!   TTL). Auth and order calls are never cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use quitanda_client::gateway::HttpGateway;
//!
//! let gateway = HttpGateway::new(&config);
//!
//! // Catalog (cached)
//! let page = gateway.products(Some(1), Some(20), None).await?;
//!
//! // Auth (via the trait)
//! let auth = gateway.login(&email, "hunter2-but-longer").await?;
//! let me = gateway.current_user(&token).await?;
//! ```

mod http;
pub mod types;

pub use http::HttpGateway;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use quitanda_core::Email;

use crate::models::{Order, User};
use types::{AuthResponse, OrderDraft, RegisterPayload};

/// Authentication-classified failures from the remote API.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Wrong email or password at login.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Registration rejected because the email is taken.
    #[error("email is already registered")]
    EmailAlreadyRegistered,

    /// The bearer token is expired or invalid.
    ///
    /// Detecting this anywhere must trigger a local logout.
    #[error("session expired or invalid")]
    SessionExpired,
}

/// Errors that can occur when calling the storefront API.
///
/// This is the complete error surface the rest of the client sees: one
/// variant per kind in the error taxonomy, decoded at this boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure - no usable response. Never retried
    /// automatically; the user decides whether to try again.
    #[error("connection error: {0}")]
    Network(#[from] reqwest::Error),

    /// Authentication failure, classified.
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// A well-formed error response from the remote side, message passed
    /// through verbatim (e.g. "produto fora de estoque").
    #[error("{0}")]
    Server(String),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether this failure means the current token is no longer valid.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::Auth(AuthFailure::SessionExpired))
    }
}

/// Call contract with the remote storefront service.
///
/// This is exactly the surface the state core consumes; catalog and
/// order-history reads live as inherent methods on [`HttpGateway`] because
/// only the presentation layer uses them.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// `Auth(InvalidCredentials)` on a rejected login, `Network`/`Server`/
    /// `Decode` per the taxonomy.
    async fn login(&self, email: &Email, password: &str) -> Result<AuthResponse, ApiError>;

    /// Create an account and authenticate in one step.
    ///
    /// # Errors
    ///
    /// `Auth(EmailAlreadyRegistered)` when the email is taken; `Server` for
    /// remote validation failures.
    async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError>;

    /// Invalidate the token server-side.
    ///
    /// Callers treat this as best-effort: local logout proceeds regardless.
    ///
    /// # Errors
    ///
    /// `Network`/`Server` per the taxonomy; `Auth(SessionExpired)` if the
    /// token was already dead.
    async fn logout(&self, token: &SecretString) -> Result<(), ApiError>;

    /// Fetch the user the token belongs to.
    ///
    /// # Errors
    ///
    /// `Auth(SessionExpired)` for an expired or invalid token.
    async fn current_user(&self, token: &SecretString) -> Result<User, ApiError>;

    /// Submit an order. The server assigns the id, status, and timestamp.
    ///
    /// # Errors
    ///
    /// `Auth(SessionExpired)` for a dead token; `Server` with the remote
    /// message for rejected submissions (e.g. out of stock).
    async fn create_order(
        &self,
        token: &SecretString,
        draft: &OrderDraft,
    ) -> Result<Order, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_display() {
        assert_eq!(
            AuthFailure::InvalidCredentials.to_string(),
            "invalid email or password"
        );
        assert_eq!(
            ApiError::Auth(AuthFailure::SessionExpired).to_string(),
            "session expired or invalid"
        );
    }

    #[test]
    fn test_server_error_is_verbatim() {
        let err = ApiError::Server("produto fora de estoque".to_string());
        assert_eq!(err.to_string(), "produto fora de estoque");
    }

    #[test]
    fn test_is_session_expired() {
        assert!(ApiError::Auth(AuthFailure::SessionExpired).is_session_expired());
        assert!(!ApiError::Auth(AuthFailure::InvalidCredentials).is_session_expired());
        assert!(!ApiError::Server("x".to_string()).is_session_expired());
    }
}
