//! Session-related types.
//!
//! Types stored in the session for authentication state and the cart.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use xtremefit_core::{SessionFlags, UserProfile};

use crate::api::AuthSession;

/// Session-stored user identity.
///
/// Holds the API token and the last profile the API returned for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Bearer token for the REST API.
    #[serde(serialize_with = "serialize_token", deserialize_with = "deserialize_token")]
    pub token: SecretString,
    /// Profile returned by login, registration or `GET /api/user`.
    pub profile: UserProfile,
}

impl CurrentUser {
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    #[must_use]
    pub fn flags(&self) -> SessionFlags {
        SessionFlags::from_profile(Some(&self.profile))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.has_admin_access()
    }
}

impl From<AuthSession> for CurrentUser {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            profile: session.user,
        }
    }
}

fn serialize_token<S>(token: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(token.expose_secret())
}

fn deserialize_token<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Unix timestamp of the last successful `GET /api/user` check.
    pub const VALIDATED_AT: &str = "validated_at";

    /// Key for storing the cart.
    pub const CART: &str = "cart";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_round_trips_token() {
        let json = r#"{"token":"tok_123","profile":{"id":1,"name":"Ana","email":"ana@x.test","role":"admin"}}"#;
        let user: CurrentUser = serde_json::from_str(json).unwrap();

        assert_eq!(user.token(), "tok_123");
        assert!(user.is_admin());
        assert!(user.flags().is_logged_in);

        let back = serde_json::to_string(&user).unwrap();
        assert!(back.contains("\"token\":\"tok_123\""));
    }

    #[test]
    fn test_debug_hides_token() {
        let user = CurrentUser {
            token: SecretString::from("tok_secret"),
            profile: serde_json::from_str(r#"{"id":1,"name":"Bo","email":"bo@x.test"}"#).unwrap(),
        };
        assert!(!format!("{user:?}").contains("tok_secret"));
    }
}
