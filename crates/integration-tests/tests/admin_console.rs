//! Integration tests for the admin console: product and order management.

use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use xtremefit_core::OrderStatus;
use xtremefit_integration_tests::{TestApp, body, location};

fn product_form(name: &str, category_id: &str, price: &str, sizes: &[&str]) -> Form {
    let mut form = Form::new()
        .text("name", name.to_string())
        .text("category_id", category_id.to_string())
        .text("description", "Built for heavy sessions.")
        .text("price", price.to_string())
        .text("stock", "25");
    for size in sizes {
        form = form.text("sizes[]", (*size).to_string());
    }
    form
}

// ============================================================================
// Access
// ============================================================================

#[tokio::test]
async fn test_guest_is_sent_to_login() {
    let app = TestApp::spawn().await;

    for path in ["/admin/products", "/admin/orders", "/admin/products/new"] {
        let response = app.get(path).await;
        assert_eq!(location(&response).as_deref(), Some("/login"), "{path}");
    }
}

#[tokio::test]
async fn test_customer_is_sent_home() {
    let app = TestApp::spawn().await;
    app.login_customer().await;

    let response = app.get("/admin/products").await;
    assert_eq!(location(&response).as_deref(), Some("/"));

    let response = app
        .post_form("/admin/orders/500/status", &[("status", "paid")])
        .await;
    assert_eq!(location(&response).as_deref(), Some("/"));
    assert!(app.api.data().status_updates.is_empty());
}

#[tokio::test]
async fn test_admin_root_redirects_to_products() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app.get("/admin").await;
    assert_eq!(location(&response).as_deref(), Some("/admin/products"));
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_product_list_and_category_filter() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let html = body(app.get("/admin/products").await).await;
    assert!(html.contains("Compression Tee"));
    assert!(html.contains("Trail Runner"));

    let html = body(app.get("/admin/products?category=2").await).await;
    assert!(html.contains("Seamless Leggings"));
    assert!(!html.contains("Compression Tee"));
}

#[tokio::test]
async fn test_size_options_follow_category() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let shoes = body(app.htmx_get("/admin/products/sizes?category_id=3").await).await;
    assert!(shoes.contains("value=\"42\""));
    assert!(!shoes.contains("value=\"XL\""));

    let clothing = body(app.htmx_get("/admin/products/sizes?category_id=1").await).await;
    assert!(clothing.contains("value=\"XL\""));
    assert!(!clothing.contains("value=\"42\""));
}

#[tokio::test]
async fn test_create_product_uploads_multipart() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let image = Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
        .file_name("hoodie.png")
        .mime_str("image/png")
        .expect("valid mime");
    let form = product_form("Power Hoodie", "1", "59.90", &["M", "L"]).part("image", image);

    let response = app
        .client
        .post(app.url("/admin/products"))
        .multipart(form)
        .send()
        .await
        .expect("create request failed");
    assert_eq!(location(&response).as_deref(), Some("/admin/products?saved=1"));

    {
        let data = app.api.data();
        let submission = data.product_submissions.last().expect("submission recorded");
        assert_eq!(submission.name, "Power Hoodie");
        assert_eq!(submission.price, "59.90");
        assert_eq!(submission.sizes, vec!["M", "L"]);
        assert_eq!(submission.image_name.as_deref(), Some("hoodie.png"));
    }

    let html = body(app.get("/admin/products?saved=1").await).await;
    assert!(html.contains("Product saved."));
    assert!(html.contains("Power Hoodie"));

    // The public catalog sees the new product immediately
    let html = body(app.get("/products").await).await;
    assert!(html.contains("Power Hoodie"));
}

#[tokio::test]
async fn test_create_product_with_blank_stock_omits_it() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let form = Form::new()
        .text("name", "Chalk Bag")
        .text("category_id", "1")
        .text("description", "")
        .text("price", "12.00")
        .text("stock", "")
        .text("sizes[]", "M");

    let response = app
        .client
        .post(app.url("/admin/products"))
        .multipart(form)
        .send()
        .await
        .expect("create request failed");
    assert_eq!(location(&response).as_deref(), Some("/admin/products?saved=1"));

    let data = app.api.data();
    let submission = data.product_submissions.last().expect("submission recorded");
    assert_eq!(submission.name, "Chalk Bag");
    assert!(submission.stock.is_none());
}

#[tokio::test]
async fn test_create_product_with_invalid_fields_is_not_sent() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app
        .client
        .post(app.url("/admin/products"))
        .multipart(product_form("", "1", "cheap", &[]))
        .send()
        .await
        .expect("create request failed");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body(response).await;
    assert!(html.contains("The name field is required."));
    assert!(html.contains("Please enter a valid price."));
    assert!(app.api.data().product_submissions.is_empty());
}

#[tokio::test]
async fn test_edit_form_is_prefilled() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app.get("/admin/products/1/edit").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body(response).await;
    assert!(html.contains("value=\"Compression Tee\""));
    assert!(html.contains("value=\"24.99\""));
    assert!(html.contains("value=\"M\" checked"));
}

#[tokio::test]
async fn test_update_product_keeps_id() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app
        .client
        .post(app.url("/admin/products/2"))
        .multipart(product_form("Seamless Leggings v2", "2", "42.00", &["S"]))
        .send()
        .await
        .expect("update request failed");
    assert_eq!(location(&response).as_deref(), Some("/admin/products?saved=1"));

    let data = app.api.data();
    let submission = data.product_submissions.last().expect("submission recorded");
    assert_eq!(submission.product_id, Some(2));
    assert_eq!(submission.name, "Seamless Leggings v2");
    assert!(submission.image_name.is_none());
}

#[tokio::test]
async fn test_delete_product() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app.post_form("/admin/products/3/delete", &[]).await;
    assert_eq!(location(&response).as_deref(), Some("/admin/products?deleted=1"));
    assert_eq!(app.api.data().deleted_products, vec![3]);

    let html = body(app.get("/admin/products?deleted=1").await).await;
    assert!(html.contains("Product deleted."));
    assert!(!html.contains("Trail Runner"));
}

#[tokio::test]
async fn test_delete_missing_product_shows_error() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app.post_form("/admin/products/999/delete", &[]).await;
    let target = location(&response).expect("redirect expected");
    assert!(target.starts_with("/admin/products?error="));
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_order_list_shows_customers() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let html = body(app.get("/admin/orders").await).await;
    assert!(html.contains("id=\"order-500\""));
    assert!(html.contains("Alex Runner"));
    for status in OrderStatus::ALL {
        assert!(html.contains(&format!("value=\"{}\"", status.as_str())));
    }
}

#[tokio::test]
async fn test_order_detail_from_admin_list() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let html = body(app.get("/admin/orders/500").await).await;
    assert!(html.contains("Order #500"));
    assert!(html.contains("alex@example.com"));
    assert!(html.contains("href=\"/admin/orders\""));

    let response = app.get("/admin/orders/404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_update_plain_form_redirects() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app
        .post_form("/admin/orders/500/status", &[("status", "shipped")])
        .await;
    assert_eq!(location(&response).as_deref(), Some("/admin/orders?updated=1"));
    assert_eq!(
        app.api.data().status_updates,
        vec![(500, "shipped".to_string())]
    );

    let html = body(app.get("/admin/orders?updated=1").await).await;
    assert!(html.contains("Order status updated."));
}

#[tokio::test]
async fn test_status_update_htmx_returns_full_row() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app
        .htmx_post_form("/admin/orders/500/status", &[("status", "paid")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body(response).await;
    assert!(html.starts_with("<tr id=\"order-500\""));
    assert!(html.contains("Alex Runner"));
    assert!(html.contains("value=\"paid\" selected"));
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let response = app
        .post_form("/admin/orders/500/status", &[("status", "teleported")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.api.data().status_updates.is_empty());
}
