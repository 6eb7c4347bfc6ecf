//! Authentication route handlers.
//!
//! Handles login, registration and logout against the REST API. The returned
//! bearer token and profile are kept in the server-side session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use xtremefit_core::Email;

use crate::api::{ApiError, FieldErrors, RegisterRequest};
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::views::Layout;

/// Role every self-registered account gets.
const CUSTOMER_ROLE: &str = "customer";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Set when the API rejected the stored token.
    pub expired: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub errors: FieldErrors,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
    pub errors: FieldErrors,
}

// =============================================================================
// Helpers
// =============================================================================

/// Message shown for a failed login or registration call.
fn failure_message(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Validation { .. } => error.form_message(),
        _ => error.message_or(fallback),
    }
}

/// Local checks run before the login request is sent.
fn validate_login(form: &LoginForm) -> std::result::Result<(), String> {
    if Email::parse(&form.email).is_err() {
        return Err("Please enter a valid email address.".to_string());
    }
    if form.password.is_empty() {
        return Err("Please enter your password.".to_string());
    }
    Ok(())
}

/// Local checks run before the registration request is sent.
fn validate_registration(form: &RegisterForm) -> std::result::Result<RegisterRequest, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Please enter your name.".to_string());
    }
    let email = Email::parse(&form.email)
        .map_err(|_| "Please enter a valid email address.".to_string())?;
    if form.password.is_empty() {
        return Err("Please choose a password.".to_string());
    }
    if form.password != form.password_confirmation {
        return Err("Passwords do not match".to_string());
    }

    Ok(RegisterRequest {
        name: name.to_string(),
        email: email.into_inner(),
        password: form.password.clone(),
        password_confirmation: form.password_confirmation.clone(),
        role: CUSTOMER_ROLE.to_string(),
    })
}

/// Store the authenticated user and send them home.
async fn start_session(session: &Session, user: CurrentUser) -> Result<Response> {
    set_current_user(session, &user).await?;
    set_sentry_user(&user.profile.id, Some(user.profile.email.as_str()));
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(user_id = %user.profile.id, admin = user.is_admin(), "User signed in");
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    layout: Layout,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        layout,
        email: String::new(),
        notice: query
            .expired
            .map(|_| "Your session has expired. Please log in again.".to_string()),
        error: None,
        errors: FieldErrors::default(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    layout: Layout,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    let render = |error: String, errors: FieldErrors| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                layout: layout.clone(),
                email: email.clone(),
                notice: None,
                error: Some(error),
                errors,
            },
        )
            .into_response()
    };

    if let Err(message) = validate_login(&form) {
        return Ok(render(message, FieldErrors::default()));
    }

    match state.api().login(&email, &form.password).await {
        Ok(auth) => start_session(&session, auth.into()).await,
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            let errors = e.field_errors().cloned().unwrap_or_default();
            Ok(render(failure_message(&e, "Login failed"), errors))
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(layout: Layout, OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        layout,
        name: String::new(),
        email: String::new(),
        error: None,
        errors: FieldErrors::default(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// A successful registration signs the new customer in immediately.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    layout: Layout,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let render = |error: String, errors: FieldErrors| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                layout: layout.clone(),
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                error: Some(error),
                errors,
            },
        )
            .into_response()
    };

    let request = match validate_registration(&form) {
        Ok(request) => request,
        Err(message) => return Ok(render(message, FieldErrors::default())),
    };

    match state.api().register(&request).await {
        Ok(auth) => start_session(&session, auth.into()).await,
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            let errors = e.field_errors().cloned().unwrap_or_default();
            Ok(render(failure_message(&e, "Register failed"), errors))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Log out.
///
/// The API call is best effort; the session user is cleared whatever the
/// network outcome. The cart stays in the session.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Response> {
    if let Some(user) = user {
        if let Err(e) = state.api().logout(user.token()).await {
            tracing::warn!("API logout failed, clearing session anyway: {e}");
        }
        tracing::info!(user_id = %user.profile.id, "User signed out");
    }

    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/").into_response())
}
