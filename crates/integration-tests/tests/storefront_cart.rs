//! Integration tests for browsing the catalog and managing the cart.

use reqwest::StatusCode;
use xtremefit_integration_tests::{TestApp, body, location};

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_home_lists_products_and_category_tiles() {
    let app = TestApp::spawn().await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body(response).await;
    assert!(html.contains("Compression Tee"));
    assert!(html.contains("$24.99"));
    assert!(html.contains("/products?category=footwear"));
}

#[tokio::test]
async fn test_footwear_tile_selects_shoe_categories() {
    let app = TestApp::spawn().await;

    let html = body(app.get("/products?category=footwear").await).await;
    assert!(html.contains("Trail Runner"));
    assert!(html.contains("Lifting Shoe"));
    assert!(!html.contains("Compression Tee"));
}

#[tokio::test]
async fn test_category_tiles_match_products_with_only_category_id() {
    let app = TestApp::spawn().await;

    let html = body(app.get("/products?category=men").await).await;
    assert!(html.contains("Squat Shorts"));
    assert!(html.contains("Compression Tee"));
    assert!(!html.contains("Lifting Shoe"));

    let html = body(app.get("/products?category=shoes").await).await;
    assert!(html.contains("Lifting Shoe"));
    assert!(!html.contains("Squat Shorts"));
}

#[tokio::test]
async fn test_products_filter_by_category() {
    let app = TestApp::spawn().await;

    let html = body(app.get("/products?category=women").await).await;
    assert!(html.contains("Seamless Leggings"));
    assert!(!html.contains("Compression Tee"));

    let html = body(app.get("/products?category=3").await).await;
    assert!(html.contains("Trail Runner"));
    assert!(!html.contains("Seamless Leggings"));
}

#[tokio::test]
async fn test_product_detail_resolves_storage_images() {
    let app = TestApp::spawn().await;

    let response = app.get("/products/3").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body(response).await;
    assert!(html.contains("Trail Runner"));
    assert!(html.contains(&format!(
        "http://{}/storage/products/runner.png",
        app.api_address
    )));
    assert!(html.contains("value=\"42\""));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/products/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quick_add_fragment_has_no_layout() {
    let app = TestApp::spawn().await;

    let html = body(app.htmx_get("/products/1/quick-add").await).await;
    assert!(html.contains("Compression Tee"));
    assert!(!html.contains("<html"));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_new_visitor_has_empty_cart() {
    let app = TestApp::spawn().await;

    let html = body(app.get("/cart").await).await;
    assert!(html.contains("Your cart is empty."));

    let count = body(app.get("/cart/count").await).await;
    assert!(count.contains(">0<"));
}

#[tokio::test]
async fn test_adding_same_product_and_size_merges_lines() {
    let app = TestApp::spawn().await;

    app.add_to_cart(1, "M", 1).await;
    app.add_to_cart(1, "M", 2).await;
    app.add_to_cart(1, "L", 1).await;

    let count = body(app.get("/cart/count").await).await;
    assert!(count.contains(">4<"), "unexpected count: {count}");

    let html = body(app.get("/cart").await).await;
    assert!(html.contains("4 items"));
    assert!(html.contains("$99.96"));
}

#[tokio::test]
async fn test_add_without_size_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form("/cart/add", &[("product_id", "1"), ("quantity", "1")])
        .await;
    let target = location(&response).expect("redirect expected");
    assert!(target.starts_with("/products/1?error="));
    assert!(target.contains("choose%20a%20size"));

    let count = body(app.get("/cart/count").await).await;
    assert!(count.contains(">0<"));
}

#[tokio::test]
async fn test_add_unknown_size_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .htmx_post_form(
            "/cart/add",
            &[("product_id", "1"), ("size", "XXL"), ("quantity", "1")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("hx-trigger").is_none());

    let html = body(response).await;
    assert!(html.contains("Size XXL is not available for this product."));
}

#[tokio::test]
async fn test_htmx_add_triggers_cart_update() {
    let app = TestApp::spawn().await;

    let response = app
        .htmx_post_form(
            "/cart/add",
            &[("product_id", "2"), ("size", "S"), ("quantity", "2")],
        )
        .await;
    assert_eq!(
        response
            .headers()
            .get("hx-trigger")
            .and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );

    let html = body(response).await;
    assert!(html.contains("Seamless Leggings added to cart."));

    let count = body(app.get("/cart/count").await).await;
    assert!(count.contains(">2<"));
}

#[tokio::test]
async fn test_update_size_and_remove_lines() {
    let app = TestApp::spawn().await;
    app.add_to_cart(1, "S", 1).await;
    app.add_to_cart(1, "M", 1).await;

    // Moving S onto M merges the two lines
    let html = body(
        app.htmx_post_form(
            "/cart/size",
            &[("product_id", "1"), ("size", "S"), ("new_size", "M")],
        )
        .await,
    )
    .await;
    assert!(html.contains("2 items"));

    let html = body(
        app.htmx_post_form(
            "/cart/update",
            &[("product_id", "1"), ("size", "M"), ("quantity", "5")],
        )
        .await,
    )
    .await;
    assert!(html.contains("5 items"));
    assert!(html.contains("$124.95"));

    let html = body(
        app.htmx_post_form("/cart/remove", &[("product_id", "1"), ("size", "M")])
            .await,
    )
    .await;
    assert!(html.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_update_quantity_below_one_keeps_one() {
    let app = TestApp::spawn().await;
    app.add_to_cart(2, "XS", 3).await;

    let response = app
        .post_form(
            "/cart/update",
            &[("product_id", "2"), ("size", "XS"), ("quantity", "0")],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/cart"));

    let count = body(app.get("/cart/count").await).await;
    assert!(count.contains(">1<"));
}

#[tokio::test]
async fn test_clear_cart() {
    let app = TestApp::spawn().await;
    app.add_to_cart(1, "M", 1).await;
    app.add_to_cart(3, "43", 1).await;

    let response = app.post_form("/cart/clear", &[]).await;
    assert_eq!(location(&response).as_deref(), Some("/cart"));

    let html = body(app.get("/cart").await).await;
    assert!(html.contains("Your cart is empty."));
}
