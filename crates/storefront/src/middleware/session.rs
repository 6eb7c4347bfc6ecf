//! Session middleware configuration and session-backed extractors.
//!
//! Sessions live in a `tower-sessions` memory store. Each one holds the
//! visitor's API token, profile and cart.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use xtremefit_core::Cart;

use super::auth::{AuthRejection, clear_current_user, mark_validated};
use crate::api::ApiError;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "xf_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

// =============================================================================
// Token Revalidation
// =============================================================================

/// Middleware that re-checks the session's API token.
///
/// Runs `GET /api/user` when the last check is older than
/// `session_revalidate_interval`. A 401 ends the session; any other failure
/// keeps it so an API hiccup does not log everyone out.
pub async fn revalidate_session_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = revalidate(&state, &session).await {
        tracing::error!("Session revalidation failed: {e}");
    }
    next.run(request).await
}

async fn revalidate(
    state: &AppState,
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    let Some(mut user) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await?
    else {
        return Ok(());
    };

    let interval =
        i64::try_from(state.config().session_revalidate_interval.as_secs()).unwrap_or(i64::MAX);
    let validated_at = session
        .get::<i64>(session_keys::VALIDATED_AT)
        .await?
        .unwrap_or(0);
    if chrono::Utc::now().timestamp().saturating_sub(validated_at) < interval {
        return Ok(());
    }

    match state.api().current_user(user.token()).await {
        Ok(profile) => {
            user.profile = profile;
            session.insert(session_keys::CURRENT_USER, &user).await?;
            mark_validated(session).await?;
        }
        Err(ApiError::Unauthorized(_)) => {
            tracing::info!(user_id = %user.profile.id, "Stored token rejected, logging out");
            clear_current_user(session).await?;
        }
        Err(e) => {
            tracing::warn!("Could not revalidate session, keeping it: {e}");
            mark_validated(session).await?;
        }
    }

    Ok(())
}

// =============================================================================
// Cart Extractor
// =============================================================================

/// The visitor's cart, loaded from the session.
///
/// Mutate it through [`SessionCart::cart_mut`] and persist with
/// [`SessionCart::save`].
///
/// # Example
///
/// ```rust,ignore
/// async fn clear(mut cart: SessionCart) -> Result<Redirect> {
///     cart.cart_mut().clear();
///     cart.save().await?;
///     Ok(Redirect::to("/cart"))
/// }
/// ```
pub struct SessionCart {
    session: Session,
    cart: Cart,
}

impl SessionCart {
    /// Load the cart from `session` (empty if none was stored).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: Session) -> Result<Self, tower_sessions::session::Error> {
        let cart = session
            .get::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default();
        Ok(Self { session, cart })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Write the cart back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(session_keys::CART, &self.cart).await
    }
}

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AuthRejection::MissingSession.into_response())?;

        // An unreadable cart must not be replaced by an empty one on the next save
        Self::load(session)
            .await
            .map_err(|e| AppError::Session(e).into_response())
    }
}
