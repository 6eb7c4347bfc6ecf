//! XTREMEFIT storefront library.
//!
//! Server-rendered storefront and admin console backed entirely by the
//! XTREMEFIT REST API. Exposed as a library so the router can be driven
//! from integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod views;
