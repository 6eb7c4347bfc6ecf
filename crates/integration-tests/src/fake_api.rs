//! In-process stand-in for the XTREMEFIT REST API.
//!
//! Serves the `/api/*` endpoints the storefront calls from seeded in-memory
//! data and records every write so tests can assert on exactly what the
//! storefront sent.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Seeded customer credentials.
pub const CUSTOMER_EMAIL: &str = "alex@example.com";
pub const CUSTOMER_PASSWORD: &str = "lift-heavy-1";
pub const CUSTOMER_NAME: &str = "Alex Runner";

/// Seeded admin credentials.
pub const ADMIN_EMAIL: &str = "coach@xtremefit.test";
pub const ADMIN_PASSWORD: &str = "coach-pass-9";

/// A registered account.
#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub token: String,
}

impl FakeUser {
    fn profile(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "role": self.role,
        })
    }
}

/// A multipart product submission received on the admin endpoints.
#[derive(Debug, Clone, Default)]
pub struct ProductSubmission {
    pub product_id: Option<u64>,
    pub name: String,
    pub category_id: String,
    pub description: String,
    pub price: String,
    pub stock: Option<String>,
    pub sizes: Vec<String>,
    pub image_name: Option<String>,
}

/// Everything the fake API knows and everything it was sent.
#[derive(Debug, Default)]
pub struct FakeData {
    pub categories: Vec<Value>,
    pub products: Vec<Value>,
    pub users: Vec<FakeUser>,
    pub orders: Vec<Value>,
    pub checkouts: Vec<Value>,
    pub product_submissions: Vec<ProductSubmission>,
    pub deleted_products: Vec<u64>,
    pub status_updates: Vec<(u64, String)>,
    pub logouts: usize,
    /// When set, every bearer token is rejected with 401.
    pub tokens_revoked: bool,
    /// When set, checkout fails with this validation message.
    pub checkout_rejection: Option<String>,
    next_id: u64,
}

impl FakeData {
    fn seeded() -> Self {
        let categories = vec![
            json!({"id": 1, "name": "Men", "slug": "men"}),
            json!({"id": 2, "name": "Women", "slug": "women"}),
            json!({"id": 3, "name": "Shoes", "slug": "shoes"}),
        ];

        let products = vec![
            json!({
                "id": 1, "name": "Compression Tee", "description": "Breathable training tee.",
                "price": "24.99", "stock": 40, "image": "products/tee.jpg",
                "sizes": ["S", "M", "L"], "category_id": 1,
                "category": {"id": 1, "name": "Men", "slug": "men"}
            }),
            json!({
                "id": 2, "name": "Seamless Leggings", "description": "High-waist leggings.",
                "price": 39.5, "stock": 12, "image": null,
                "sizes": "XS, S, M", "category_id": 2,
                "category": {"id": 2, "name": "Women", "slug": "women"}
            }),
            json!({
                "id": 3, "name": "Trail Runner", "description": "Grippy outsole.",
                "price": "89.00", "stock": 0, "image": "/storage/products/runner.png",
                "sizes": [42, 43, 44], "category_id": 3,
                "category": {"id": 3, "name": "Shoes", "slug": "shoes"}
            }),
            // Older records carry only the flat category id
            json!({
                "id": 4, "name": "Squat Shorts", "price": "19.00", "stock": 8,
                "sizes": ["M", "L"], "category_id": 1
            }),
            json!({
                "id": 5, "name": "Lifting Shoe", "price": "120.00", "stock": 3,
                "sizes": "41, 42", "category_id": 3
            }),
        ];

        let users = vec![
            FakeUser {
                id: 10,
                name: CUSTOMER_NAME.to_string(),
                email: CUSTOMER_EMAIL.to_string(),
                password: CUSTOMER_PASSWORD.to_string(),
                role: "customer".to_string(),
                token: "customer-token".to_string(),
            },
            FakeUser {
                id: 1,
                name: "Coach".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                role: "admin".to_string(),
                token: "admin-token".to_string(),
            },
        ];

        let orders = vec![json!({
            "id": 500, "status": "pending", "payment_method": "cash",
            "address": "12 Iron Street", "total": "49.98",
            "created_at": "2026-03-14T09:30:00Z",
            "user_id": 10,
            "user": {"name": CUSTOMER_NAME, "email": CUSTOMER_EMAIL},
            "items": [{
                "id": 1, "product_id": 1, "size": "M", "quantity": 2, "unit_price": "24.99",
                "product": {"id": 1, "name": "Compression Tee", "image": "products/tee.jpg"}
            }]
        })];

        Self {
            categories,
            products,
            users,
            orders,
            next_id: 1000,
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<FakeUser> {
        if self.tokens_revoked {
            return None;
        }
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.users.iter().find(|user| user.token == token).cloned()
    }

    fn product(&self, id: u64) -> Option<&Value> {
        self.products
            .iter()
            .find(|product| product["id"].as_u64() == Some(id))
    }

    fn category(&self, id: &str) -> Value {
        id.parse::<u64>()
            .ok()
            .and_then(|id| {
                self.categories
                    .iter()
                    .find(|category| category["id"].as_u64() == Some(id))
                    .cloned()
            })
            .unwrap_or(Value::Null)
    }
}

/// Shared handle to the fake API's data.
#[derive(Debug, Clone)]
pub struct FakeApi {
    data: Arc<Mutex<FakeData>>,
}

impl FakeApi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(FakeData::seeded())),
        }
    }

    /// Lock the data for inspection or modification.
    pub fn data(&self) -> MutexGuard<'_, FakeData> {
        self.data.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Router serving the `/api` endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/products", get(list_products))
            .route("/api/products/{id}", get(show_product))
            .route("/api/categories", get(list_categories))
            .route("/api/login", post(login))
            .route("/api/register", post(register))
            .route("/api/logout", post(logout))
            .route("/api/user", get(current_user))
            .route("/api/checkout", post(checkout))
            .route("/api/my-orders", get(my_orders))
            .route("/api/my-orders/{id}", get(my_order))
            .route(
                "/api/admin/products",
                get(admin_products).post(create_product),
            )
            .route(
                "/api/admin/products/{id}",
                post(update_product).delete(delete_product),
            )
            .route("/api/admin/orders", get(admin_orders))
            .route("/api/admin/orders/{id}", axum::routing::put(update_order))
            .with_state(self.clone())
    }
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Unauthenticated."})),
    )
        .into_response()
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"message": "This action is unauthorized."})),
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": "Not found."}))).into_response()
}

fn validation(field: &str, message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"message": message, "errors": {field: [message]}})),
    )
        .into_response()
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_products(State(api): State<FakeApi>) -> Json<Value> {
    Json(Value::Array(api.data().products.clone()))
}

async fn show_product(State(api): State<FakeApi>, Path(id): Path<u64>) -> Response {
    api.data().product(id).cloned().map_or_else(not_found, |product| {
        Json(json!({"data": product})).into_response()
    })
}

async fn list_categories(State(api): State<FakeApi>) -> Json<Value> {
    Json(json!({"data": api.data().categories.clone()}))
}

// =============================================================================
// Account
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(api): State<FakeApi>, Json(body): Json<LoginBody>) -> Response {
    let data = api.data();
    match data
        .users
        .iter()
        .find(|user| user.email == body.email && user.password == body.password)
    {
        Some(user) => Json(json!({"token": user.token, "user": user.profile()})).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    password_confirmation: String,
    role: String,
}

async fn register(State(api): State<FakeApi>, Json(body): Json<RegisterBody>) -> Response {
    let mut data = api.data();

    if data.users.iter().any(|user| user.email == body.email) {
        return validation("email", "The email has already been taken.");
    }
    if body.password != body.password_confirmation {
        return validation("password", "The password confirmation does not match.");
    }

    let id = data.next_id();
    let user = FakeUser {
        id,
        name: body.name,
        email: body.email,
        password: body.password,
        role: body.role,
        token: format!("token-{id}"),
    };
    let response = json!({"token": user.token, "user": user.profile()});
    data.users.push(user);

    (StatusCode::CREATED, Json(response)).into_response()
}

async fn logout(State(api): State<FakeApi>) -> Json<Value> {
    api.data().logouts += 1;
    Json(json!({"message": "Logged out"}))
}

async fn current_user(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    api.data()
        .user_for(&headers)
        .map_or_else(unauthenticated, |user| Json(user.profile()).into_response())
}

// =============================================================================
// Orders
// =============================================================================

async fn checkout(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = api.data();
    let Some(user) = data.user_for(&headers) else {
        return unauthenticated();
    };

    data.checkouts.push(body.clone());

    if let Some(message) = data.checkout_rejection.clone() {
        return validation("items", &message);
    }

    let mut total_cents = 0u64;
    let mut items = Vec::new();
    for item in body["items"].as_array().into_iter().flatten() {
        let product_id = item["product_id"].as_u64().unwrap_or_default();
        let quantity = item["quantity"].as_u64().unwrap_or_default();
        let product = data.product(product_id).cloned().unwrap_or(Value::Null);
        let unit = product["price"]
            .as_str()
            .map(ToString::to_string)
            .or_else(|| product["price"].as_f64().map(|price| format!("{price:.2}")))
            .unwrap_or_else(|| "0.00".to_string());
        total_cents += unit.replace('.', "").parse::<u64>().unwrap_or_default() * quantity;
        items.push(json!({
            "product_id": product_id,
            "size": item["size"],
            "quantity": quantity,
            "unit_price": unit,
            "product": {"id": product_id, "name": product["name"], "image": product["image"]},
        }));
    }

    let id = data.next_id();
    let order = json!({
        "id": id,
        "status": "pending",
        "payment_method": body["payment_method"],
        "address": body["address"],
        "total": format!("{}.{:02}", total_cents / 100, total_cents % 100),
        "created_at": "2026-04-01 12:00:00",
        "user_id": user.id,
        "user": {"name": user.name, "email": user.email},
        "items": items,
    });
    data.orders.push(order.clone());

    (StatusCode::CREATED, Json(json!({"order": order}))).into_response()
}

fn orders_for(data: &FakeData, user: &FakeUser) -> Vec<Value> {
    data.orders
        .iter()
        .filter(|order| order["user_id"].as_u64() == Some(user.id))
        .cloned()
        .collect()
}

async fn my_orders(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    let data = api.data();
    let Some(user) = data.user_for(&headers) else {
        return unauthenticated();
    };
    Json(json!({"orders": orders_for(&data, &user)})).into_response()
}

async fn my_order(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    let data = api.data();
    let Some(user) = data.user_for(&headers) else {
        return unauthenticated();
    };
    orders_for(&data, &user)
        .into_iter()
        .find(|order| order["id"].as_u64() == Some(id))
        .map_or_else(not_found, |order| Json(json!({"order": order})).into_response())
}

// =============================================================================
// Admin
// =============================================================================

fn require_admin(data: &FakeData, headers: &HeaderMap) -> Result<FakeUser, Response> {
    let user = data.user_for(headers).ok_or_else(unauthenticated)?;
    if user.role == "admin" {
        Ok(user)
    } else {
        Err(forbidden())
    }
}

async fn admin_products(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    let data = api.data();
    if let Err(response) = require_admin(&data, &headers) {
        return response;
    }
    Json(json!({"data": data.products.clone()})).into_response()
}

async fn read_submission(mut multipart: Multipart) -> ProductSubmission {
    let mut submission = ProductSubmission::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            submission.image_name = field.file_name().map(ToString::to_string);
            let _ = field.bytes().await;
            continue;
        }
        let value = field.text().await.unwrap_or_default();
        match name.as_str() {
            "name" => submission.name = value,
            "category_id" => submission.category_id = value,
            "description" => submission.description = value,
            "price" => submission.price = value,
            "stock" => submission.stock = Some(value),
            "sizes[]" => submission.sizes.push(value),
            _ => {}
        }
    }
    submission
}

fn product_from_submission(data: &FakeData, id: u64, submission: &ProductSubmission) -> Value {
    let category = data.category(&submission.category_id);
    json!({
        "id": id,
        "name": submission.name,
        "description": submission.description,
        "price": submission.price,
        "stock": submission.stock.as_deref().and_then(|stock| stock.parse::<i64>().ok()),
        "image": submission.image_name.as_ref().map(|name| format!("products/{name}")),
        "sizes": submission.sizes,
        "category_id": category["id"],
        "category": category,
    })
}

async fn create_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let authorized = require_admin(&api.data(), &headers);
    if let Err(response) = authorized {
        return response;
    }
    let submission = read_submission(multipart).await;

    let mut data = api.data();
    if submission.name.trim().is_empty() {
        data.product_submissions.push(submission);
        return validation("name", "The name field is required.");
    }
    let id = data.next_id();
    let product = product_from_submission(&data, id, &submission);
    data.products.push(product.clone());
    data.product_submissions.push(submission);

    (StatusCode::CREATED, Json(json!({"product": product}))).into_response()
}

async fn update_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Response {
    let authorized = require_admin(&api.data(), &headers);
    if let Err(response) = authorized {
        return response;
    }
    let mut submission = read_submission(multipart).await;
    submission.product_id = Some(id);

    let mut data = api.data();
    let Some(index) = data
        .products
        .iter()
        .position(|product| product["id"].as_u64() == Some(id))
    else {
        return not_found();
    };
    let mut product = product_from_submission(&data, id, &submission);
    if submission.image_name.is_none()
        && let Some(existing) = data.products.get(index)
    {
        product["image"] = existing["image"].clone();
    }
    if let Some(slot) = data.products.get_mut(index) {
        *slot = product.clone();
    }
    data.product_submissions.push(submission);

    Json(json!({"product": product})).into_response()
}

async fn delete_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    let mut data = api.data();
    if let Err(response) = require_admin(&data, &headers) {
        return response;
    }
    if data.product(id).is_none() {
        return not_found();
    }
    data.products
        .retain(|product| product["id"].as_u64() != Some(id));
    data.deleted_products.push(id);

    StatusCode::NO_CONTENT.into_response()
}

async fn admin_orders(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    let data = api.data();
    if let Err(response) = require_admin(&data, &headers) {
        return response;
    }
    Json(Value::Array(data.orders.clone())).into_response()
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

async fn update_order(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<StatusBody>,
) -> Response {
    let mut data = api.data();
    if let Err(response) = require_admin(&data, &headers) {
        return response;
    }
    let Some(order) = data
        .orders
        .iter_mut()
        .find(|order| order["id"].as_u64() == Some(id))
    else {
        return not_found();
    };
    order["status"] = Value::String(body.status.clone());
    // Mirrors the real API: the updated record comes back without relations
    let bare = json!({"id": id, "status": body.status, "total": order["total"]});
    data.status_updates.push((id, body.status));

    Json(bare).into_response()
}
