//! Authentication endpoints.

use reqwest::Method;
use tracing::instrument;

use xtremefit_core::UserProfile;

use super::types::{AuthResponse, AuthSession, ItemEnvelope, LoginRequest, RegisterRequest};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Exchange credentials for a token (`POST /api/login`).
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let request = self
            .request(Method::POST, "login", None)
            .json(&LoginRequest { email, password });
        let response: AuthResponse = self.execute(request).await?;
        Ok(response.into())
    }

    /// Create an account and log it in (`POST /api/register`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the registration or the request fails.
    #[instrument(skip(self, payload), fields(email = %payload.email))]
    pub async fn register(&self, payload: &RegisterRequest) -> Result<AuthSession, ApiError> {
        let request = self.request(Method::POST, "register", None).json(payload);
        let response: AuthResponse = self.execute(request).await?;
        Ok(response.into())
    }

    /// Revoke a token (`POST /api/logout`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. Callers treat this as best-effort.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.execute_unit(self.request(Method::POST, "logout", Some(token)))
            .await
    }

    /// Fetch the profile that owns `token` (`GET /api/user`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        let envelope: ItemEnvelope<UserProfile> = self
            .execute(self.request(Method::GET, "user", Some(token)))
            .await?;
        Ok(envelope.into_inner())
    }
}
