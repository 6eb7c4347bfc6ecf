//! Integration tests for login, registration, logout and session expiry.

use reqwest::StatusCode;
use xtremefit_integration_tests::{
    CUSTOMER_EMAIL, CUSTOMER_NAME, CUSTOMER_PASSWORD, TestApp, body, location,
};

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_greets_user_and_hides_admin_link() {
    let app = TestApp::spawn().await;
    app.login_customer().await;

    let html = body(app.get("/").await).await;
    assert!(html.contains(&format!("Hi, {CUSTOMER_NAME}")));
    assert!(!html.contains("href=\"/admin/products\""));
}

#[tokio::test]
async fn test_admin_login_shows_admin_link() {
    let app = TestApp::spawn().await;
    app.login_admin().await;

    let html = body(app.get("/").await).await;
    assert!(html.contains("href=\"/admin/products\""));
}

#[tokio::test]
async fn test_wrong_password_shows_server_message() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/login",
            &[("email", CUSTOMER_EMAIL), ("password", "not-it")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body(response).await;
    assert!(html.contains("Invalid credentials"));
    assert!(html.contains(&format!("value=\"{CUSTOMER_EMAIL}\"")));
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form("/login", &[("email", ""), ("password", "")])
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body(response).await.contains("Please enter a valid email address."));
}

#[tokio::test]
async fn test_login_page_redirects_when_signed_in() {
    let app = TestApp::spawn().await;
    app.login_customer().await;

    let response = app.get("/login").await;
    assert_eq!(location(&response).as_deref(), Some("/"));
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_creates_customer_and_signs_in() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Sam Squat"),
                ("email", "sam@example.com"),
                ("password", "deadlift-22"),
                ("password_confirmation", "deadlift-22"),
            ],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/"));

    {
        let data = app.api.data();
        let user = data
            .users
            .iter()
            .find(|user| user.email == "sam@example.com")
            .expect("user registered");
        assert_eq!(user.role, "customer");
    }

    let html = body(app.get("/").await).await;
    assert!(html.contains("Hi, Sam Squat"));
}

#[tokio::test]
async fn test_register_password_mismatch_never_reaches_api() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Sam Squat"),
                ("email", "sam@example.com"),
                ("password", "deadlift-22"),
                ("password_confirmation", "deadlift-23"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body(response).await.contains("Passwords do not match"));
    assert_eq!(app.api.data().users.len(), 2);
}

#[tokio::test]
async fn test_register_duplicate_email_shows_field_error() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Copy Cat"),
                ("email", CUSTOMER_EMAIL),
                ("password", "whatever-1"),
                ("password_confirmation", "whatever-1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body(response).await;
    assert!(html.contains("The email has already been taken."));
    assert!(html.contains("value=\"Copy Cat\""));
}

// ============================================================================
// Logout and expiry
// ============================================================================

#[tokio::test]
async fn test_logout_keeps_cart() {
    let app = TestApp::spawn().await;
    app.login_customer().await;
    app.add_to_cart(1, "M", 2).await;

    let response = app.post_form("/logout", &[]).await;
    assert_eq!(location(&response).as_deref(), Some("/"));
    assert_eq!(app.api.data().logouts, 1);

    let html = body(app.get("/").await).await;
    assert!(!html.contains("Hi, "));

    let count = body(app.get("/cart/count").await).await;
    assert!(count.contains(">2<"));
}

#[tokio::test]
async fn test_logout_when_api_rejects_token_still_signs_out() {
    let app = TestApp::spawn().await;
    app.login_customer().await;
    app.api.data().tokens_revoked = true;

    let response = app.post_form("/logout", &[]).await;
    assert_eq!(location(&response).as_deref(), Some("/"));

    let response = app.get("/my-orders").await;
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_rejected_token_ends_session() {
    let app = TestApp::spawn().await;
    app.login_customer().await;
    app.api.data().tokens_revoked = true;

    let response = app.get("/my-orders").await;
    assert_eq!(location(&response).as_deref(), Some("/login?expired=1"));

    let html = body(app.get("/login?expired=1").await).await;
    assert!(html.contains("Your session has expired. Please log in again."));

    let html = body(app.get("/").await).await;
    assert!(!html.contains(&format!("Hi, {CUSTOMER_NAME}")));
}

#[tokio::test]
async fn test_rejected_token_htmx_gets_redirect_header() {
    let app = TestApp::spawn().await;
    app.login_customer().await;
    app.api.data().tokens_revoked = true;

    let response = app.htmx_get("/my-orders").await;
    assert_eq!(
        response
            .headers()
            .get("hx-redirect")
            .and_then(|v| v.to_str().ok()),
        Some("/login?expired=1")
    );
}

#[tokio::test]
async fn test_revalidation_catches_revoked_token_on_any_page() {
    let app = TestApp::spawn_with(&[("STOREFRONT_SESSION_REVALIDATE_SECS", "0")]).await;
    app.login_customer().await;
    app.api.data().tokens_revoked = true;

    let response = app.get("/products").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body(response).await.contains(&format!("Hi, {CUSTOMER_NAME}")));

    let response = app.get("/checkout").await;
    assert!(body(response).await.contains("You need to be logged in"));
}

#[tokio::test]
async fn test_valid_password_after_failed_attempt() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form("/login", &[("email", CUSTOMER_EMAIL), ("password", "nope")])
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    app.login(CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;
}
