//! Security headers middleware for XSS, clickjacking, and isolation protection.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;
use crate::state::AppState;

/// Where the HTMX bundle is loaded from.
pub const HTMX_SCRIPT_URL: &str = "https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js";
const HTMX_ORIGIN: &str = "https://unpkg.com";

/// Build the `Content-Security-Policy` value for one response.
///
/// Scripts are limited to our own origin, the HTMX CDN and the request's
/// nonce. Product images may come from the storage host.
#[must_use]
pub fn content_security_policy(nonce: Option<&CspNonce>, storage_origin: Option<&str>) -> String {
    let mut script_src = format!("'self' {HTMX_ORIGIN}");
    if let Some(nonce) = nonce {
        script_src.push(' ');
        script_src.push_str(&nonce.source());
    }

    let mut img_src = String::from("'self' data:");
    if let Some(origin) = storage_origin {
        img_src.push(' ');
        img_src.push_str(origin);
    }

    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src {img_src}; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: same-origin`
/// - `Content-Security-Policy` (see [`content_security_policy`])
/// - `Permissions-Policy` denying camera, microphone, geolocation and payment
/// - `Cache-Control: no-store` unless the handler set its own
/// - `Cross-Origin-Opener-Policy: same-origin`
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let storage_origin = state.config().storage_origin();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

    let csp = content_security_policy(nonce.as_ref(), storage_origin.as_deref());
    match HeaderValue::from_str(&csp) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!("Invalid CSP header value: {e}"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), microphone=(), geolocation=(), payment=()"),
    );

    // Pages carry the visitor's cart and profile
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_includes_nonce_and_storage_origin() {
        let nonce = CspNonce("abc123".to_string());
        let csp = content_security_policy(Some(&nonce), Some("https://cdn.xtremefit.test"));

        assert!(csp.contains("script-src 'self' https://unpkg.com 'nonce-abc123';"));
        assert!(csp.contains("img-src 'self' data: https://cdn.xtremefit.test;"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_csp_without_nonce() {
        let csp = content_security_policy(None, None);
        assert!(csp.contains("script-src 'self' https://unpkg.com;"));
        assert!(csp.contains("img-src 'self' data:;"));
    }
}
