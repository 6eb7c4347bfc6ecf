//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors and transactions)
//! 2. Request ID (add unique ID to each request)
//! 3. `TraceLayer` (request span carrying the request ID)
//! 4. CSP nonce (generate per-request nonce for the inline script)
//! 5. Security headers (CSP, frame, referrer, permissions)
//! 6. Session layer (tower-sessions with in-memory store)
//! 7. Session expiry (log out after the API answered 401)
//! 8. Token revalidation (periodic `GET /api/user`)
//! 9. Rate limiting on login/register routes (governor)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, expire_session_middleware,
    set_current_user,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SessionCart, create_session_layer, revalidate_session_middleware};
