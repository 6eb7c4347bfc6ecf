//! Admin console route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin):
//! guests are sent to `/login`, logged-in customers to `/`.
//!
//! ```text
//! GET  /admin                          - Redirect to products
//! GET  /admin/products                 - Product table (?category= filter)
//! GET  /admin/products/new             - New product form
//! POST /admin/products                 - Create product (multipart)
//! GET  /admin/products/sizes           - Size checkboxes for a category (HTMX)
//! GET  /admin/products/{id}/edit       - Edit product form
//! POST /admin/products/{id}            - Update product (multipart)
//! POST /admin/products/{id}/delete     - Delete product
//! GET  /admin/orders                   - Order table
//! GET  /admin/orders/{id}              - Order detail
//! POST /admin/orders/{id}/status       - Change order status
//! ```

pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted product form, image included.
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/admin/products") }))
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new_product))
        .route("/products/sizes", get(products::size_options))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}/delete", post(products::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
