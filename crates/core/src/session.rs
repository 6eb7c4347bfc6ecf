//! Authenticated user profile and derived session flags.
//!
//! The storefront keeps the profile returned by `POST /api/login`,
//! `POST /api/register` or `GET /api/user`. Whether the visitor is logged in,
//! and whether they may use the admin console, is always computed from the
//! profile and never stored separately.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Email, UserId, UserRole};

/// A user as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub role: UserRole,
    /// Legacy admin flag; some API versions send `is_admin: 1` instead of a role.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_admin: bool,
}

impl UserProfile {
    /// Whether this user may use the admin console.
    #[must_use]
    pub fn has_admin_access(&self) -> bool {
        self.role == UserRole::Admin || self.is_admin
    }

    /// Name to greet the user with, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.email.as_str()
        } else {
            &self.name
        }
    }
}

/// Flags derived from the (optional) current profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionFlags {
    pub is_logged_in: bool,
    pub is_admin: bool,
}

impl SessionFlags {
    /// Compute the flags for the given profile.
    #[must_use]
    pub fn from_profile(profile: Option<&UserProfile>) -> Self {
        profile.map_or_else(Self::default, |user| Self {
            is_logged_in: true,
            is_admin: user.has_admin_access(),
        })
    }
}

/// Accept `true`/`false`, `1`/`0`, `"1"`/`"true"` and `null` for boolean flags.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(value)) => value,
        Some(Flag::Int(value)) => value == 1,
        Some(Flag::Text(value)) => matches!(value.trim(), "1" | "true"),
        None => false,
    })
}
