//! Presentation helpers shared by page handlers.
//!
//! Templates only receive pre-formatted strings and booleans; everything that
//! needs formatting or a fallback is done here.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use tower_sessions::Session;

use xtremefit_core::{Cart, OrderStatus};

use crate::api::{Order, OrderItem, Product};
use crate::middleware::CspNonce;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

// =============================================================================
// Layout
// =============================================================================

/// Data every full page needs for the shared layout (navigation, cart badge,
/// CSP nonce).
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub nonce: String,
    pub htmx_src: &'static str,
    pub user_name: Option<String>,
    pub is_logged_in: bool,
    pub is_admin: bool,
    pub cart_count: u32,
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|nonce| nonce.value().to_string())
            .unwrap_or_else(|| {
                tracing::warn!("CSP nonce not found in request extensions");
                String::new()
            });

        let mut layout = Self {
            nonce,
            htmx_src: crate::middleware::security_headers::HTMX_SCRIPT_URL,
            ..Self::default()
        };

        if let Some(session) = parts.extensions.get::<Session>() {
            let user = session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten();
            let cart = session
                .get::<Cart>(session_keys::CART)
                .await
                .ok()
                .flatten()
                .unwrap_or_default();

            layout.cart_count = cart.item_count();
            if let Some(user) = user {
                let flags = user.flags();
                layout.is_logged_in = flags.is_logged_in;
                layout.is_admin = flags.is_admin;
                layout.user_name = Some(user.profile.display_name().to_string());
            }
        }

        Ok(layout)
    }
}

/// Whether the request was issued by HTMX (`HX-Request: true`).
#[derive(Debug, Clone, Copy)]
pub struct HxRequest(pub bool);

impl<S> FromRequestParts<S> for HxRequest
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get("hx-request")
                .is_some_and(|value| value == "true"),
        ))
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Resolve a product image reference to a URL.
///
/// Absolute `http(s)` URLs are used as-is; relative storage paths are joined
/// to the storage base URL.
#[must_use]
pub fn image_url(storage_url: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|path| !path.is_empty())?;
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    let path = path.trim_start_matches('/');
    let path = path.strip_prefix("storage/").unwrap_or(path);
    Some(format!("{storage_url}/{path}"))
}

/// "1 item" / "N items".
#[must_use]
pub fn item_count_label(count: u32) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{count} items")
    }
}

/// Format an API timestamp for display, falling back to the raw value.
#[must_use]
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return "-".to_string();
    };

    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|date| date.format("%b %-d, %Y %H:%M").to_string())
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|date| date.format("%b %-d, %Y %H:%M").to_string())
        })
        .unwrap_or_else(|_| raw.to_string())
}

// =============================================================================
// Shared View Models
// =============================================================================

/// One `<option>` of a size picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeOption {
    pub value: String,
    pub selected: bool,
}

impl SizeOption {
    /// Options for `sizes`, with `selected` (or the first size) preselected.
    #[must_use]
    pub fn list(sizes: &[String], selected: Option<&str>) -> Vec<Self> {
        let selected = selected.or_else(|| sizes.first().map(String::as_str));
        sizes
            .iter()
            .map(|size| Self {
                value: size.clone(),
                selected: Some(size.as_str()) == selected,
            })
            .collect()
    }
}

/// Product tile for grids.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub category: String,
    pub image_url: Option<String>,
    pub in_stock: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, storage_url: &str) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.display(),
            category: product.category_name().to_string(),
            image_url: image_url(storage_url, product.image.as_deref()),
            in_stock: product.stock.is_none_or(|stock| stock > 0),
        }
    }
}

/// Order status pill.
#[derive(Debug, Clone)]
pub struct StatusPill {
    pub label: &'static str,
    pub class: &'static str,
}

impl From<OrderStatus> for StatusPill {
    fn from(status: OrderStatus) -> Self {
        Self {
            label: status.label(),
            class: status.pill_class(),
        }
    }
}

/// Order row for order lists.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: String,
    pub date: String,
    pub status: StatusPill,
    pub payment: String,
    pub total: String,
    pub items: String,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            date: format_date(order.created_at.as_deref()),
            status: order.status.into(),
            payment: order.payment_label().to_string(),
            total: order.total.display(),
            items: item_count_label(order.item_count()),
        }
    }
}

/// Line of an order detail page.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: Option<String>,
}

impl OrderLine {
    #[must_use]
    pub fn new(item: &OrderItem, storage_url: &str) -> Self {
        Self {
            name: item.product_name(),
            size: item.size.clone().unwrap_or_default(),
            quantity: item.quantity,
            unit_price: item.unit_price.display(),
            line_total: item.total().display(),
            image_url: image_url(storage_url, item.product_image()),
        }
    }
}

/// Full order detail.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub summary: OrderSummary,
    pub address: String,
    pub customer: Option<String>,
    pub lines: Vec<OrderLine>,
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: &Order, storage_url: &str) -> Self {
        Self {
            summary: order.into(),
            address: order
                .address
                .clone()
                .filter(|address| !address.trim().is_empty())
                .unwrap_or_else(|| "-".to_string()),
            customer: order.user.as_ref().map(|user| {
                if user.email.is_empty() {
                    user.name.clone()
                } else {
                    format!("{} ({})", user.name, user.email)
                }
            }),
            lines: order
                .items
                .iter()
                .map(|item| OrderLine::new(item, storage_url))
                .collect(),
        }
    }
}
