//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every mutation loads it, applies
//! one `Cart` method and stores it back. HTMX requests get the refreshed cart
//! fragment plus a `cart-updated` trigger for the header badge; plain form
//! posts are redirected back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use xtremefit_core::cart::{coerce_quantity, normalize_size};
use xtremefit_core::{Cart, CartLine, ProductId};

use crate::api::{ApiError, Product};
use crate::error::Result;
use crate::filters;
use crate::middleware::SessionCart;
use crate::state::AppState;
use crate::views::{HxRequest, Layout, SizeOption, image_url, item_count_label};

/// HTMX event fired whenever the cart changes.
pub const CART_UPDATED_TRIGGER: [(&str, &str); 1] = [("HX-Trigger", "cart-updated")];

/// Shown when checkout is attempted with an unsized line.
pub const MISSING_SIZE_MESSAGE: &str = "Please choose a size for all products before checkout.";

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    /// Current size, or empty for "no size".
    pub size: String,
    pub size_options: Vec<SizeOption>,
    pub needs_size: bool,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: Option<String>,
}

impl CartLineView {
    fn new(line: &CartLine, storage_url: &str) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            size: line.size.clone().unwrap_or_default(),
            size_options: line
                .available_sizes
                .iter()
                .map(|size| SizeOption {
                    value: size.clone(),
                    selected: line.size.as_deref() == Some(size.as_str()),
                })
                .collect(),
            needs_size: line.needs_size(),
            quantity: line.quantity,
            unit_price: line.unit_price.display(),
            line_total: line.line_total().display(),
            image_url: image_url(storage_url, line.image.as_deref()),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
    pub item_label: String,
    pub missing_size: bool,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, storage_url: &str) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView::new(line, storage_url))
                .collect(),
            subtotal: cart.subtotal().display(),
            item_count: cart.item_count(),
            item_label: item_count_label(cart.item_count()),
            missing_size: cart.has_missing_size(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: Option<String>,
}

/// Change size form data.
#[derive(Debug, Deserialize)]
pub struct ChangeSizeForm {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub new_size: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    pub size: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart contents fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_contents.html")]
pub struct CartContentsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Add-to-cart result fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/add_result.html")]
pub struct AddResultTemplate {
    pub success: bool,
    pub message: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Pick the size to add for `product`.
///
/// Products without sizes always get `None`. Products with sizes require one
/// of their own sizes.
fn choose_size(product: &Product, requested: Option<&str>) -> std::result::Result<Option<String>, String> {
    if product.sizes.is_empty() {
        return Ok(None);
    }
    match normalize_size(requested) {
        None => Err("Please choose a size.".to_string()),
        Some(size) if product.offers_size(&size) => Ok(Some(size)),
        Some(size) => Err(format!("Size {size} is not available for this product.")),
    }
}

/// Respond to a cart mutation.
fn cart_changed(is_htmx: bool, cart: &Cart, storage_url: &str) -> Response {
    if is_htmx {
        (
            CART_UPDATED_TRIGGER,
            CartContentsTemplate {
                cart: CartView::new(cart, storage_url),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, layout, cart))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    cart: SessionCart,
) -> impl IntoResponse {
    CartShowTemplate {
        layout,
        cart: CartView::new(cart.cart(), &state.config().storage_url),
    }
}

/// Add item to cart.
///
/// The product is fetched so the line snapshots the current name, price and
/// image rather than trusting the form.
#[instrument(skip(state, cart))]
pub async fn add(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    mut cart: SessionCart,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let outcome = match state.api().get_product(form.product_id).await {
        Ok(product) => choose_size(&product, form.size.as_deref()).map(|size| (product, size)),
        Err(ApiError::NotFound) => Err("This product is no longer available.".to_string()),
        Err(e) => {
            tracing::warn!(product_id = %form.product_id, "Failed to load product for cart: {e}");
            Err(e.message_or("Failed to add to cart"))
        }
    };

    let (product, size) = match outcome {
        Ok(found) => found,
        Err(message) if is_htmx => {
            return Ok(AddResultTemplate {
                success: false,
                message,
            }
            .into_response());
        }
        Err(message) => {
            return Ok(Redirect::to(&format!(
                "/products/{}?error={}",
                form.product_id,
                urlencoding::encode(&message)
            ))
            .into_response());
        }
    };

    let quantity = coerce_quantity(form.quantity.as_deref());
    cart.cart_mut()
        .add(&product.to_cart_product(), size.as_deref(), quantity);
    cart.save().await?;

    tracing::info!(product_id = %product.id, quantity, "Added to cart");

    if is_htmx {
        Ok((
            CART_UPDATED_TRIGGER,
            AddResultTemplate {
                success: true,
                message: format!("{} added to cart.", product.name),
            },
        )
            .into_response())
    } else {
        Ok(Redirect::to("/cart").into_response())
    }
}

/// Update line quantity.
#[instrument(skip(state, cart))]
pub async fn update(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    mut cart: SessionCart,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let quantity = coerce_quantity(form.quantity.as_deref());
    cart.cart_mut()
        .update_quantity(form.product_id, form.size.as_deref(), i64::from(quantity));
    cart.save().await?;

    Ok(cart_changed(is_htmx, cart.cart(), &state.config().storage_url))
}

/// Move a line to another size.
#[instrument(skip(state, cart))]
pub async fn change_size(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    mut cart: SessionCart,
    Form(form): Form<ChangeSizeForm>,
) -> Result<Response> {
    cart.cart_mut().change_size(
        form.product_id,
        form.size.as_deref(),
        form.new_size.as_deref(),
    );
    cart.save().await?;

    Ok(cart_changed(is_htmx, cart.cart(), &state.config().storage_url))
}

/// Remove a line.
#[instrument(skip(state, cart))]
pub async fn remove(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    mut cart: SessionCart,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    cart.cart_mut()
        .remove(form.product_id, form.size.as_deref());
    cart.save().await?;

    Ok(cart_changed(is_htmx, cart.cart(), &state.config().storage_url))
}

/// Empty the cart.
#[instrument(skip(state, cart))]
pub async fn clear(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    mut cart: SessionCart,
) -> Result<Response> {
    cart.cart_mut().clear();
    cart.save().await?;

    Ok(cart_changed(is_htmx, cart.cart(), &state.config().storage_url))
}

/// Cart count badge (HTMX).
pub async fn count(cart: SessionCart) -> impl IntoResponse {
    CartCountTemplate {
        count: cart.cart().item_count(),
    }
}
