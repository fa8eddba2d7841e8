//! Quitanda client commerce core.
//!
//! This crate is the state core behind the Quitanda storefront client: the
//! shopping cart, the authenticated session, and the checkout flow that
//! coordinates them with order submission. Presentation (pages, rendering,
//! routing) lives elsewhere and only reads store state, subscribes to change
//! events, and dispatches operations into the core.
//!
//! # Architecture
//!
//! - [`cart::CartStore`] - in-memory cart with computed totals, independent
//!   of authentication. Mutations are synchronous and infallible.
//! - [`session::SessionStore`] - authentication lifecycle with credentials
//!   persisted across restarts.
//! - [`checkout::CheckoutFlow`] - the address -> payment -> submission state
//!   machine. Snapshots the cart at submission time and clears it exactly
//!   once on success.
//! - [`gateway`] - the remote API boundary. All transport and status-code
//!   decoding happens here; the stores only ever see [`gateway::ApiError`].
//!
//! Stores are owned by the application root and passed by reference to
//! whichever component needs them - there are no global singletons. All
//! mutations run to completion on a single logical task; only gateway calls
//! suspend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod gateway;
pub mod models;
pub mod session;

pub use cart::{CartEvent, CartStore};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutState};
pub use config::{ClientConfig, ConfigError};
pub use gateway::{ApiError, AuthFailure, HttpGateway, RemoteGateway};
pub use models::{Address, CartLine, Order, Product, User};
pub use session::{RegisterProfile, SessionError, SessionEvent, SessionStore};

#[cfg(test)]
pub(crate) mod testing;
