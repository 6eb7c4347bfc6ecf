//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in customer or an admin in
//! route handlers, plus the middleware that ends a session once the API
//! reports its token as expired.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{SESSION_EXPIRED_REDIRECT, SessionExpired};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// If the visitor is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.profile.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in admin.
///
/// Guests are sent to the login page; logged-in customers to the home page.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when authentication or admin access is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Logged in, but not an admin.
    RedirectHome,
    /// The session layer is missing.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::MissingSession => {
                tracing::error!("Session not found in request extensions - layer misconfigured");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Read the current user from the session in `parts`.
async fn session_user(parts: &Parts) -> Result<Option<CurrentUser>, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::MissingSession)?;

    Ok(session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await?
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)
            .await?
            .ok_or(AuthRejection::RedirectToLogin)?;

        if user.is_admin() {
            Ok(Self(user))
        } else {
            Err(AuthRejection::RedirectHome)
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the visitor is not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await.ok().flatten()))
    }
}

/// Store a freshly authenticated user in the session.
///
/// Cycles the session id first so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    mark_validated(session).await
}

/// Record that the session's token was just confirmed by the API.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn mark_validated(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::VALIDATED_AT, chrono::Utc::now().timestamp())
        .await
}

/// Remove the user from the session (logout). The cart is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.remove::<i64>(session_keys::VALIDATED_AT).await?;
    Ok(())
}

/// Middleware that logs the visitor out when a handler hit a 401 from the API.
///
/// HTMX requests additionally receive an `HX-Redirect` header so the browser
/// navigates to the login page instead of swapping the redirect target into
/// the current page.
pub async fn expire_session_middleware(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let is_htmx = request.headers().contains_key("hx-request");

    let mut response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    if let Some(session) = session {
        tracing::info!("API token rejected, ending session");
        if let Err(e) = clear_current_user(&session).await {
            tracing::error!("Failed to clear expired session: {e}");
        }
    }
    crate::error::clear_sentry_user();

    if is_htmx {
        response.headers_mut().insert(
            "hx-redirect",
            HeaderValue::from_static(SESSION_EXPIRED_REDIRECT),
        );
    }

    response
}
