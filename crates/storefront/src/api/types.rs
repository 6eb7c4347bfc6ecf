//! Wire types for the REST API.
//!
//! The API is not fully consistent between endpoints: lists may be bare
//! arrays or wrapped in `data`/`orders`, prices may be strings or numbers,
//! and product sizes may be an array or a comma-separated string. The types
//! here accept every shape the API is known to send.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use xtremefit_core::{
    CartProduct, CategoryId, CheckoutItem, OrderId, OrderItemId, OrderStatus, PaymentMethod,
    Price, ProductId, UserProfile,
};

// =============================================================================
// Envelopes
// =============================================================================

/// A list response: `[..]`, `{"data": [..]}`, `{"orders": [..]}` or `{"products": [..]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
    Orders { orders: Vec<T> },
    Products { products: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items)
            | Self::Data { data: items }
            | Self::Orders { orders: items }
            | Self::Products { products: items } => items,
        }
    }
}

/// A single-record response: the record itself or wrapped in `data`/`order`/`product`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ItemEnvelope<T> {
    Data { data: T },
    Order { order: T },
    Product { product: T },
    Bare(T),
}

impl<T> ItemEnvelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Data { data: item }
            | Self::Order { order: item }
            | Self::Product { product: item }
            | Self::Bare(item) => item,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Filter key that selects every shoe category.
pub const FOOTWEAR_KEY: &str = "footwear";

impl Category {
    /// Whether this category sells shoes (shoe sizes instead of clothing sizes).
    #[must_use]
    pub fn is_footwear(&self) -> bool {
        self.name.to_lowercase().contains("shoe")
    }

    /// Whether a filter key names this category by id, slug or name.
    #[must_use]
    pub fn matches_key(&self, key: &str) -> bool {
        let key = key.trim();
        self.id.to_string() == key
            || self.name.eq_ignore_ascii_case(key)
            || self
                .slug
                .as_deref()
                .is_some_and(|slug| slug.eq_ignore_ascii_case(key))
    }
}

/// A `?category=` key resolved against the category list.
///
/// Products are matched on their category id, so records that only carry
/// `category_id` filter the same as records with an embedded category.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    key: String,
    ids: Vec<CategoryId>,
}

impl CategoryFilter {
    #[must_use]
    pub fn resolve(categories: &[Category], key: &str) -> Self {
        let key = key.trim();
        if key.is_empty() {
            return Self::default();
        }

        let footwear = key.eq_ignore_ascii_case(FOOTWEAR_KEY);
        let mut ids: Vec<CategoryId> = categories
            .iter()
            .filter(|category| category.matches_key(key) || (footwear && category.is_footwear()))
            .map(|category| category.id)
            .collect();
        // Categories may have failed to load; a numeric key still filters
        if ids.is_empty()
            && let Ok(id) = key.parse::<CategoryId>()
        {
            ids.push(id);
        }

        Self {
            key: key.to_string(),
            ids,
        }
    }

    /// True when no category was asked for.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.key.is_empty()
    }

    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if self.is_all() {
            return true;
        }
        product
            .effective_category_id()
            .is_some_and(|id| self.ids.contains(&id))
            || product.in_category(&self.key)
    }
}

/// Category embedded in a product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(default)]
    pub id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A product as returned by the catalog and admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_sizes")]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
}

impl Product {
    /// Name of the product's category, or "Other".
    #[must_use]
    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map(|category| category.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Other")
    }

    /// The category id from either the flat field or the embedded category.
    #[must_use]
    pub fn effective_category_id(&self) -> Option<CategoryId> {
        self.category_id
            .or_else(|| self.category.as_ref().and_then(|category| category.id))
    }

    /// Whether the product belongs to the category named by `key`.
    ///
    /// `key` may be a category id, a slug, or a name (case-insensitive).
    /// The key `footwear` matches every shoe category.
    #[must_use]
    pub fn in_category(&self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return true;
        }
        if let Ok(id) = key.parse::<CategoryId>()
            && self.effective_category_id() == Some(id)
        {
            return true;
        }
        self.category.as_ref().is_some_and(|category| {
            category.name.eq_ignore_ascii_case(key)
                || category
                    .slug
                    .as_deref()
                    .is_some_and(|slug| slug.eq_ignore_ascii_case(key))
                || (key.eq_ignore_ascii_case(FOOTWEAR_KEY)
                    && category.name.to_lowercase().contains("shoe"))
        })
    }

    /// Whether `size` is one of this product's sizes.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|offered| offered == size)
    }

    /// Snapshot for adding to the cart.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
            sizes: self.sizes.clone(),
        }
    }
}

/// Accept `["S","M"]`, `"S, M"`, `""` or `null`.
fn deserialize_sizes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Sizes {
        List(Vec<SizeValue>),
        Joined(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeValue {
        Text(String),
        Number(i64),
    }

    let sizes = match Option::<Sizes>::deserialize(deserializer)? {
        Some(Sizes::List(values)) => values
            .into_iter()
            .map(|value| match value {
                SizeValue::Text(text) => text,
                SizeValue::Number(number) => number.to_string(),
            })
            .collect(),
        Some(Sizes::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };

    Ok(sizes
        .into_iter()
        .map(|size| size.trim().to_string())
        .filter(|size| !size.is_empty())
        .collect())
}

// =============================================================================
// Orders
// =============================================================================

/// Customer attached to an order in admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Product snapshot embedded in an order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product: Option<OrderProduct>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: Price,
    #[serde(default)]
    pub line_total: Option<Price>,
}

impl OrderItem {
    /// The server's line total, or unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.line_total
            .unwrap_or_else(|| self.unit_price.times(self.quantity))
    }

    /// Product name, falling back to the product id.
    #[must_use]
    pub fn product_name(&self) -> String {
        match (&self.product, self.product_id) {
            (Some(product), _) if !product.name.is_empty() => product.name.clone(),
            (_, Some(id)) => format!("Product #{id}"),
            _ => "Product".to_string(),
        }
    }

    #[must_use]
    pub fn product_image(&self) -> Option<&str> {
        self.product.as_ref().and_then(|product| product.image.as_deref())
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub address: Option<String>,
    pub total: Price,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of item quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Payment method label, or "-".
    #[must_use]
    pub fn payment_label(&self) -> &str {
        self.payment_method
            .as_ref()
            .map_or("-", PaymentMethod::label)
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration payload.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub role: String,
}

/// Checkout payload.
#[derive(Debug, Serialize)]
pub struct CheckoutRequest {
    pub address: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdateRequest {
    pub status: OrderStatus,
}

/// An uploaded product image.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Admin create/update product submission.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: String,
    pub category_id: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub sizes: Vec<String>,
    pub image: Option<ImageUpload>,
}

impl ProductInput {
    /// Build the multipart form sent to the admin product endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the image content type is not a valid MIME type.
    pub fn to_multipart(&self) -> Result<reqwest::multipart::Form, reqwest::Error> {
        let mut form = reqwest::multipart::Form::new()
            .text("name", self.name.clone())
            .text("category_id", self.category_id.clone())
            .text("description", self.description.clone())
            .text("price", self.price.clone());

        if !self.stock.trim().is_empty() {
            form = form.text("stock", self.stock.trim().to_string());
        }

        for size in &self.sizes {
            form = form.text("sizes[]", size.clone());
        }

        if let Some(image) = &self.image {
            let mut part = reqwest::multipart::Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone());
            if let Some(content_type) = &image.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part("image", part);
        }

        Ok(form)
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Token and profile returned by login or registration.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: SecretString,
    pub user: UserProfile,
}

impl AuthSession {
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl From<AuthResponse> for AuthSession {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: SecretString::from(response.token),
            user: response.user,
        }
    }
}

/// Error body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Option<crate::api::FieldErrors>,
}
