//! Admin product management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use xtremefit_core::{Price, ProductId};

use crate::api::{ApiError, Category, CategoryFilter, FieldErrors, ImageUpload, Product, ProductInput};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::views::{Layout, image_url};

/// Sizes offered for clothing categories.
pub const CLOTHING_SIZES: [&str; 5] = ["S", "M", "L", "XL", "XXL"];

/// EU shoe sizes offered for footwear categories.
const SHOE_SIZES: std::ops::RangeInclusive<u32> = 20..=47;

const FIX_ERRORS_MESSAGE: &str = "Please fix the highlighted errors.";

/// Size choices for a category.
#[must_use]
pub fn size_choices(is_footwear: bool) -> Vec<String> {
    if is_footwear {
        SHOE_SIZES.map(|size| size.to_string()).collect()
    } else {
        CLOTHING_SIZES.iter().map(ToString::to_string).collect()
    }
}

// =============================================================================
// View Types
// =============================================================================

/// Product table row.
#[derive(Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub stock: String,
    pub sizes: String,
    pub image_url: Option<String>,
}

impl ProductRow {
    fn new(product: &Product, storage_url: &str) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category_name().to_string(),
            price: product.price.display(),
            stock: product.stock.map(|stock| stock.to_string()).unwrap_or_default(),
            sizes: product.sizes.join(", "),
            image_url: image_url(storage_url, product.image.as_deref()),
        }
    }
}

/// `<option>` of the category select.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Size checkbox.
#[derive(Clone)]
pub struct SizeCheckbox {
    pub value: String,
    pub checked: bool,
}

/// Checkboxes for the category's sizes. Sizes a product already has that
/// are not in the standard list stay checked so saving keeps them.
fn size_checkboxes(is_footwear: bool, checked: &[String]) -> Vec<SizeCheckbox> {
    let choices = size_choices(is_footwear);
    let extra: Vec<SizeCheckbox> = checked
        .iter()
        .filter(|size| !choices.contains(size))
        .map(|size| SizeCheckbox {
            value: size.clone(),
            checked: true,
        })
        .collect();

    choices
        .into_iter()
        .map(|value| SizeCheckbox {
            checked: checked.contains(&value),
            value,
        })
        .chain(extra)
        .collect()
}

fn is_footwear(categories: &[Category], category_id: &str) -> bool {
    categories
        .iter()
        .find(|category| category.id.to_string() == category_id.trim())
        .is_some_and(Category::is_footwear)
}

/// Everything the create/edit form renders.
#[derive(Clone)]
pub struct ProductFormView {
    pub title: String,
    pub action: String,
    pub submit_label: &'static str,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub categories: Vec<CategoryOption>,
    pub sizes: Vec<SizeCheckbox>,
    pub image_url: Option<String>,
}

impl ProductFormView {
    fn new(target: Option<ProductId>, input: &ProductInput, categories: &[Category]) -> Self {
        let (title, action, submit_label) = match target {
            Some(id) => (
                format!("Edit product #{id}"),
                format!("/admin/products/{id}"),
                "Save changes",
            ),
            None => (
                "New product".to_string(),
                "/admin/products".to_string(),
                "Create product",
            ),
        };

        Self {
            title,
            action,
            submit_label,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price.clone(),
            stock: input.stock.clone(),
            categories: categories
                .iter()
                .map(|category| CategoryOption {
                    id: category.id.to_string(),
                    name: category.name.clone(),
                    selected: category.id.to_string() == input.category_id,
                })
                .collect(),
            sizes: size_checkboxes(is_footwear(categories, &input.category_id), &input.sizes),
            image_url: None,
        }
    }
}

/// Prefill the form from an existing product.
fn input_from_product(product: &Product) -> ProductInput {
    ProductInput {
        name: product.name.clone(),
        category_id: product
            .effective_category_id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        description: product.description.clone().unwrap_or_default(),
        price: product.price.to_input_value(),
        stock: product.stock.map(|stock| stock.to_string()).unwrap_or_default(),
        sizes: product.sizes.clone(),
        image: None,
    }
}

/// Checks run before the form is sent to the API.
fn validate(input: &ProductInput) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if input.name.trim().is_empty() {
        errors.push("name", "The name field is required.");
    }
    if input.category_id.trim().is_empty() {
        errors.push("category_id", "Please choose a category.");
    }
    if Price::parse(&input.price).is_err() {
        errors.push("price", "Please enter a valid price.");
    }
    // Blank stock is left for the API to default
    let stock = input.stock.trim();
    if !stock.is_empty() && stock.parse::<u32>().is_err() {
        errors.push("stock", "Stock must be a whole number.");
    }
    errors
}

/// Read the multipart product form.
async fn read_product_form(mut multipart: Multipart) -> Result<ProductInput> {
    let mut input = ProductInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(ToString::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            // Browsers send an empty part when no file was chosen
            if !file_name.is_empty() && !bytes.is_empty() {
                input.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "name" => input.name = value.trim().to_string(),
            "category_id" => input.category_id = value.trim().to_string(),
            "description" => input.description = value,
            "price" => input.price = value.trim().to_string(),
            "stock" => input.stock = value.trim().to_string(),
            "sizes" | "sizes[]" => {
                let value = value.trim();
                if !value.is_empty() {
                    input.sizes.push(value.to_string());
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown product form field"),
        }
    }

    Ok(input)
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the product table.
#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub category: Option<String>,
    pub saved: Option<String>,
    pub deleted: Option<String>,
    pub error: Option<String>,
}

/// Query parameters for the size fragment.
#[derive(Debug, Deserialize)]
pub struct SizesQuery {
    pub category_id: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Product table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct AdminProductsTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRow>,
    pub categories: Vec<CategoryOption>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub form: ProductFormView,
    pub error: Option<String>,
    pub errors: FieldErrors,
}

/// Size checkbox fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "admin/partials/size_options.html")]
pub struct SizeOptionsTemplate {
    pub sizes: Vec<SizeCheckbox>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product table.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<IndexQuery>,
) -> Result<impl IntoResponse> {
    let (products, categories) = tokio::join!(
        state.api().admin_products(user.token()),
        state.api().list_categories()
    );
    let products = products?;
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to load categories: {e}");
        Vec::new()
    });

    let filter = query.category.unwrap_or_default();
    let category_filter = CategoryFilter::resolve(&categories, &filter);
    let storage_url = &state.config().storage_url;

    let notice = if query.deleted.is_some() {
        Some("Product deleted.".to_string())
    } else {
        query.saved.map(|_| "Product saved.".to_string())
    };

    Ok(AdminProductsTemplate {
        layout,
        products: products
            .iter()
            .filter(|product| category_filter.matches(product))
            .map(|product| ProductRow::new(product, storage_url))
            .collect(),
        categories: categories
            .iter()
            .map(|category| CategoryOption {
                id: category.id.to_string(),
                name: category.name.clone(),
                selected: category.id.to_string() == filter.trim(),
            })
            .collect(),
        notice,
        error: query.error.filter(|error| !error.is_empty()),
    })
}

/// Display the empty product form.
#[instrument(skip_all)]
pub async fn new_product(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_user): RequireAdmin,
) -> Result<impl IntoResponse> {
    let categories = state.api().list_categories().await?;

    Ok(ProductFormTemplate {
        layout,
        form: ProductFormView::new(None, &ProductInput::default(), &categories),
        error: None,
        errors: FieldErrors::default(),
    })
}

/// Display the edit form for an existing product.
#[instrument(skip(state, layout, _user))]
pub async fn edit(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_user): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let (product, categories) =
        tokio::join!(state.api().get_product(id), state.api().list_categories());
    let product = product?;
    let categories = categories?;

    let mut form = ProductFormView::new(Some(id), &input_from_product(&product), &categories);
    form.image_url = image_url(&state.config().storage_url, product.image.as_deref());

    Ok(ProductFormTemplate {
        layout,
        form,
        error: None,
        errors: FieldErrors::default(),
    })
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(user): RequireAdmin,
    multipart: Multipart,
) -> Result<Response> {
    let input = read_product_form(multipart).await?;
    save(&state, layout, &user, None, input).await
}

/// Update a product.
#[instrument(skip(state, layout, user, multipart))]
pub async fn update(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let input = read_product_form(multipart).await?;
    save(&state, layout, &user, Some(id), input).await
}

/// Validate, submit and either redirect or re-render the form with errors.
async fn save(
    state: &AppState,
    layout: Layout,
    user: &CurrentUser,
    target: Option<ProductId>,
    input: ProductInput,
) -> Result<Response> {
    let local_errors = validate(&input);

    let failure = if local_errors.is_empty() {
        let result = match target {
            Some(id) => state.api().update_product(user.token(), id, &input).await,
            None => state.api().create_product(user.token(), &input).await,
        };
        match result {
            Ok(product) => {
                tracing::info!(product_id = %product.id, "Product saved");
                add_breadcrumb("admin", "Product saved", None);
                return Ok(Redirect::to("/admin/products?saved=1").into_response());
            }
            Err(e @ (ApiError::Unauthorized(_) | ApiError::Forbidden(_))) => {
                return Err(AppError::Api(e));
            }
            Err(ApiError::Validation { errors, .. }) => (FIX_ERRORS_MESSAGE.to_string(), errors),
            Err(e) => {
                tracing::warn!("Product save failed: {e}");
                (e.form_message(), FieldErrors::default())
            }
        }
    } else {
        (FIX_ERRORS_MESSAGE.to_string(), local_errors)
    };

    let categories = state.api().list_categories().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to load categories: {e}");
        Vec::new()
    });

    let (error, errors) = failure;
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        ProductFormTemplate {
            layout,
            form: ProductFormView::new(target, &input, &categories),
            error: Some(error),
            errors,
        },
    )
        .into_response())
}

/// Delete a product and return to the table.
#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    match state.api().delete_product(user.token(), id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            Ok(Redirect::to("/admin/products?deleted=1").into_response())
        }
        Err(e @ (ApiError::Unauthorized(_) | ApiError::Forbidden(_))) => Err(AppError::Api(e)),
        Err(e) => {
            tracing::warn!(product_id = %id, "Product delete failed: {e}");
            let message = e.message_or("Failed to delete product");
            Ok(Redirect::to(&format!(
                "/admin/products?error={}",
                urlencoding::encode(&message)
            ))
            .into_response())
        }
    }
}

/// Size checkboxes for the chosen category (HTMX).
#[instrument(skip(state, _user))]
pub async fn size_options(
    State(state): State<AppState>,
    RequireAdmin(_user): RequireAdmin,
    Query(query): Query<SizesQuery>,
) -> impl IntoResponse {
    let categories = state.api().list_categories().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to load categories: {e}");
        Vec::new()
    });
    let category_id = query.category_id.unwrap_or_default();

    SizeOptionsTemplate {
        sizes: size_checkboxes(is_footwear(&categories, &category_id), &[]),
    }
}
