//! XTREMEFIT Core - Shared domain types.
//!
//! This crate provides the types used by every XTREMEFIT component:
//! - `storefront` - Customer-facing shop and admin console
//! - `integration-tests` - End-to-end tests against a fake REST API
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no session storage. The remote REST API is the source of truth;
//! everything here mirrors its records or derives from them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, statuses and roles
//! - [`cart`] - The shopping cart reducer (one line per product and size)
//! - [`session`] - Authenticated user profile and derived session flags

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod session;
pub mod types;

pub use cart::{Cart, CartLine, CartProduct, CheckoutItem};
pub use session::{SessionFlags, UserProfile};
pub use types::*;
