//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use xtremefit_core::ProductId;

use crate::api::{Category, CategoryFilter, FOOTWEAR_KEY, Product};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;
use crate::views::{Layout, ProductCard, SizeOption, image_url};

// =============================================================================
// View Types
// =============================================================================

/// Category filter chip.
#[derive(Clone)]
pub struct CategoryChip {
    pub name: String,
    pub href: String,
    pub active: bool,
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub category: String,
    pub image_url: Option<String>,
    pub sizes: Vec<SizeOption>,
    pub in_stock: bool,
}

impl ProductDetail {
    fn new(product: &Product, storage_url: &str) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product
                .description
                .clone()
                .filter(|description| !description.trim().is_empty()),
            price: product.price.display(),
            category: product.category_name().to_string(),
            image_url: image_url(storage_url, product.image.as_deref()),
            sizes: SizeOption::list(&product.sizes, None),
            in_stock: product.stock.is_none_or(|stock| stock > 0),
        }
    }
}

/// Build the chip row: "All" followed by one chip per category.
fn category_chips(categories: &[Category], selected: Option<&Category>) -> Vec<CategoryChip> {
    let mut chips = vec![CategoryChip {
        name: "All".to_string(),
        href: "/products".to_string(),
        active: selected.is_none(),
    }];
    chips.extend(categories.iter().map(|category| CategoryChip {
        name: category.name.clone(),
        href: format!("/products?category={}", category.id),
        active: selected.is_some_and(|selected| selected.id == category.id),
    }));
    chips
}

/// Find the category a filter key refers to (id, slug or name).
fn find_category<'a>(categories: &'a [Category], key: &str) -> Option<&'a Category> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|category| category.matches_key(key))
        .or_else(|| {
            key.eq_ignore_ascii_case(FOOTWEAR_KEY)
                .then(|| categories.iter().find(|category| category.is_footwear()))
                .flatten()
        })
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the product grid.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// Query parameters for the product page.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Product grid template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub heading: String,
    pub chips: Vec<CategoryChip>,
    pub products: Vec<ProductCard>,
    pub error: Option<String>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetail,
    pub error: Option<String>,
}

/// Quick add modal fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_add.html")]
pub struct QuickAddTemplate {
    pub product: ProductDetail,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product grid, optionally filtered by category.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<ProductsQuery>,
) -> impl IntoResponse {
    let storage_url = &state.config().storage_url;
    let key = query.category.unwrap_or_default();

    let (products, categories) =
        tokio::join!(state.api().list_products(), state.api().list_categories());

    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to load categories: {e}");
        Vec::new()
    });
    let selected = find_category(&categories, &key);
    let filter = CategoryFilter::resolve(&categories, &key);

    let (products, error) = match products {
        Ok(products) => (
            products
                .iter()
                .filter(|product| filter.matches(product))
                .map(|product| ProductCard::new(product, storage_url))
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::warn!("Failed to load products: {e}");
            (Vec::new(), Some(e.message_or("Failed to load products")))
        }
    };

    let heading = selected.map_or_else(
        || {
            if key.trim().is_empty() {
                "All Products".to_string()
            } else {
                key.trim().to_string()
            }
        },
        |category| category.name.clone(),
    );

    ProductsIndexTemplate {
        layout,
        heading,
        chips: category_chips(&categories, selected),
        products,
        error,
    }
}

/// Display a product detail page.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(id): Path<ProductId>,
    Query(query): Query<ShowQuery>,
) -> Result<impl IntoResponse> {
    let product = state.api().get_product(id).await?;

    Ok(ProductShowTemplate {
        layout,
        product: ProductDetail::new(&product, &state.config().storage_url),
        error: query.error.filter(|error| !error.is_empty()),
    })
}

/// Quick add modal fragment (HTMX).
#[instrument(skip(state))]
pub async fn quick_add(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.api().get_product(id).await?;

    Ok(QuickAddTemplate {
        product: ProductDetail::new(&product, &state.config().storage_url),
    })
}
