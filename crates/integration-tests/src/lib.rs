//! Integration tests for the XTREMEFIT storefront.
//!
//! Each test spawns two servers on ephemeral ports:
//!
//! - a [`FakeApi`] standing in for the REST backend
//! - the real storefront router, configured to talk to that fake
//!
//! and drives the storefront over HTTP with a cookie-keeping client, the
//! way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p xtremefit-integration-tests
//! ```

pub mod fake_api;

use std::net::SocketAddr;

use reqwest::{Client, Response, redirect};
use tokio::net::TcpListener;

use xtremefit_storefront::{app::build_router, config::StorefrontConfig, state::AppState};

pub use fake_api::{
    ADMIN_EMAIL, ADMIN_PASSWORD, CUSTOMER_EMAIL, CUSTOMER_NAME, CUSTOMER_PASSWORD, FakeApi,
    FakeData, ProductSubmission,
};

/// A running storefront wired to a [`FakeApi`].
pub struct TestApp {
    pub address: SocketAddr,
    pub api_address: SocketAddr,
    pub client: Client,
    pub api: FakeApi,
}

impl TestApp {
    /// Spawn with default settings.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    /// Spawn with extra `STOREFRONT_*` settings.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn spawn_with(overrides: &[(&str, &str)]) -> Self {
        let api = FakeApi::new();
        let api_address = serve(api.router()).await;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront listener");
        let address = listener
            .local_addr()
            .expect("Failed to read storefront address");

        let api_base_url = format!("http://{api_address}");
        let base_url = format!("http://{address}");
        let overrides: Vec<(String, String)> = overrides
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();

        let config = StorefrontConfig::from_lookup(|key| {
            if let Some((_, value)) = overrides.iter().find(|(name, _)| name == key) {
                return Some(value.clone());
            }
            match key {
                "STOREFRONT_API_BASE_URL" => Some(api_base_url.clone()),
                "STOREFRONT_BASE_URL" => Some(base_url.clone()),
                "STOREFRONT_RATE_LIMIT" => Some("false".to_string()),
                _ => None,
            }
        })
        .expect("Invalid test configuration");

        let state = AppState::new(config).expect("Failed to build storefront state");
        let router = build_router(state);
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Storefront server failed");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address,
            api_address,
            client,
            api,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET as HTMX would, with the `HX-Request` header set.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn htmx_get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("HTMX GET request failed")
    }

    /// POST an urlencoded form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// POST an urlencoded form as HTMX would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn htmx_post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("HTMX POST request failed")
    }

    /// Log in through the storefront's login form.
    ///
    /// # Panics
    ///
    /// Panics if the login is not accepted.
    pub async fn login(&self, email: &str, password: &str) {
        let response = self
            .post_form("/login", &[("email", email), ("password", password)])
            .await;
        assert_eq!(
            location(&response).as_deref(),
            Some("/"),
            "login as {email} was not accepted"
        );
    }

    pub async fn login_customer(&self) {
        self.login(CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;
    }

    pub async fn login_admin(&self) {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    }

    /// Put one product line in the cart.
    ///
    /// # Panics
    ///
    /// Panics if the storefront does not accept the line.
    pub async fn add_to_cart(&self, product_id: u64, size: &str, quantity: u32) {
        let product_id = product_id.to_string();
        let quantity = quantity.to_string();
        let response = self
            .post_form(
                "/cart/add",
                &[
                    ("product_id", &product_id),
                    ("size", size),
                    ("quantity", &quantity),
                ],
            )
            .await;
        assert_eq!(location(&response).as_deref(), Some("/cart"));
    }
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// Read the body of `response` as text.
///
/// # Panics
///
/// Panics if the body cannot be read.
pub async fn body(response: Response) -> String {
    response.text().await.expect("Failed to read response body")
}

async fn serve(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake API listener");
    let address = listener
        .local_addr()
        .expect("Failed to read fake API address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Fake API server failed");
    });
    address
}
