//! Quitanda Core - Shared types library.
//!
//! This crate provides common types used across all Quitanda components:
//! - `client` - The client-side commerce state core (cart, session, checkout)
//! - `integration-tests` - End-to-end tests against a mock storefront API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
