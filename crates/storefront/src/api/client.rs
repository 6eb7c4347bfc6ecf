//! `ApiClient` and the request/response plumbing shared by every endpoint.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;

use super::cache::{CacheKey, CacheValue};
use super::types::ErrorBody;
use super::{ApiError, FieldErrors};
use crate::config::StorefrontConfig;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the shop REST API.
///
/// Cheap to clone; all clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(config: &StorefrontConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .user_agent(concat!("xtremefit-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.clone(),
                cache,
            }),
        })
    }

    /// Start a request to `/api/{path}`, optionally authenticated.
    pub(super) fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}/api/{}", self.inner.base_url, path.trim_start_matches('/'));
        let builder = self
            .inner
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");

        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode the JSON body.
    pub(super) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send(request).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose response body is ignored.
    pub(super) async fn execute_unit(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let error = classify(status, &body);
            match &error {
                ApiError::Status { .. } => tracing::warn!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "API returned non-success status"
                ),
                _ => tracing::debug!(status = %status, "API rejected request"),
            }
            return Err(error);
        }

        Ok(body)
    }

    pub(super) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }
}

/// Turn a non-2xx response into an [`ApiError`].
pub(super) fn classify(status: StatusCode, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let server_message = parsed
        .message
        .or(parsed.error)
        .filter(|message| !message.trim().is_empty());

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(server_message.unwrap_or_default()),
        StatusCode::FORBIDDEN => ApiError::Forbidden(server_message.unwrap_or_default()),
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation {
            message: server_message
                .unwrap_or_else(|| "The given data was invalid.".to_string()),
            errors: parsed.errors.unwrap_or_else(FieldErrors::default),
        },
        _ => ApiError::Status {
            status: status.as_u16(),
            message: server_message
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unauthorized_keeps_message() {
        let err = classify(StatusCode::UNAUTHORIZED, r#"{"message":"Invalid credentials"}"#);
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid credentials"));

        let err = classify(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m.is_empty()));
    }

    #[test]
    fn test_classify_validation() {
        let err = classify(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"The given data was invalid.","errors":{"address":["Address is required."]}}"#,
        );
        assert_eq!(err.form_message(), "Address is required.");
        assert_eq!(
            err.field_errors().and_then(|errors| errors.first("address")),
            Some("Address is required.")
        );
    }

    #[test]
    fn test_classify_status_message_precedence() {
        let err = classify(StatusCode::BAD_REQUEST, r#"{"error":"Out of stock"}"#);
        assert!(matches!(err, ApiError::Status { status: 400, ref message } if message == "Out of stock"));

        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Cart invalid","error":"ignored"}"#,
        );
        assert_eq!(err.form_message(), "Cart invalid");

        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.form_message(), "Request failed with status 500");
    }

    #[test]
    fn test_classify_not_found_and_forbidden() {
        assert!(matches!(classify(StatusCode::NOT_FOUND, "{}"), ApiError::NotFound));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, r#"{"message":"Admins only"}"#),
            ApiError::Forbidden(ref m) if m == "Admins only"
        ));
    }
}
