//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (REST API reachable)
//!
//! # Products
//! GET  /products                 - Product grid (?category= filter)
//! GET  /products/{id}            - Product detail
//! GET  /products/{id}/quick-add  - Quick add modal fragment (HTMX)
//!
//! # Cart
//! GET  /cart                     - Cart page
//! POST /cart/add                 - Add to cart (HTMX fragment or redirect)
//! POST /cart/update              - Change quantity
//! POST /cart/size                - Change size
//! POST /cart/remove              - Remove line
//! POST /cart/clear               - Empty the cart
//! GET  /cart/count               - Cart count badge (fragment)
//!
//! # Checkout and orders (requires login)
//! GET  /checkout                 - Checkout form
//! POST /checkout                 - Place order
//! GET  /my-orders                - Order history
//! GET  /my-orders/{id}           - Order detail
//!
//! # Auth
//! GET  /login                    - Login page
//! POST /login                    - Login action (rate limited)
//! GET  /register                 - Register page
//! POST /register                 - Register action (rate limited)
//! POST /logout                   - Logout action
//!
//! # Admin console (requires admin)
//! see [`admin`]
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::config::StorefrontConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Only the form submissions are rate limited so the pages themselves stay
/// reachable.
pub fn auth_routes(config: &StorefrontConfig) -> Router<AppState> {
    let submit = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));

    let submit = match (config.rate_limit, auth_rate_limiter()) {
        (true, Some(limiter)) => submit.layer(limiter),
        (true, None) => {
            tracing::error!("Rate limiter configuration rejected, auth routes are unlimited");
            submit
        }
        (false, _) => submit,
    };

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(submit)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/quick-add", get(products::quick_add))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/size", post(cart::change_size))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the order history routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all routes for the storefront.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .nest("/my-orders", order_routes())
        .merge(auth_routes(config))
        .nest("/admin", admin::routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the REST API is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.api().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
