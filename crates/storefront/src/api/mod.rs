//! Client for the shop REST API.
//!
//! # Architecture
//!
//! - The REST API is the source of truth for products, categories, users and
//!   orders. Nothing is stored locally apart from the visitor's session.
//! - Catalog reads (products, categories) are cached in memory via `moka`.
//!   Admin product writes invalidate the cache.
//! - Every non-2xx response is classified into an [`ApiError`] so handlers
//!   can react to 401/403/422 without inspecting status codes.
//!
//! # Example
//!
//! ```rust,ignore
//! use xtremefit_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config)?;
//!
//! let products = client.list_products().await?;
//! let session = client.login("ana@example.com", "secret").await?;
//! let orders = client.my_orders(session.token()).await?;
//! ```

mod account;
mod admin;
mod cache;
mod catalog;
mod client;
mod orders;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};
use thiserror::Error;

/// Errors that can occur when calling the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, timeout, ...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("Invalid response: {0}")]
    Parse(#[from] serde_json::Error),

    /// 401: the token is missing, expired or was revoked.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403: the token is valid but lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404.
    #[error("Not found")]
    NotFound,

    /// 422: field-level validation failure.
    #[error("Validation failed: {message}")]
    Validation { message: String, errors: FieldErrors },

    /// Any other non-2xx response.
    #[error("{message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// The server-provided message, if the server sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message) | Self::Forbidden(message) => Some(message),
            Self::Validation { message, .. } | Self::Status { message, .. } => Some(message),
            Self::Network(_) | Self::Parse(_) | Self::NotFound => None,
        }
        .filter(|message| !message.is_empty())
        .map(String::as_str)
    }

    /// The server's message, or `fallback` when there is none.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Self::Network(_) | Self::Parse(_) => {
                "Could not reach the store right now. Please try again.".to_string()
            }
            _ => self.server_message().unwrap_or(fallback).to_string(),
        }
    }

    /// Message for a submitted form: the first field error on a 422,
    /// otherwise the server message or the status fallback.
    #[must_use]
    pub fn form_message(&self) -> String {
        if let Self::Validation { errors, message } = self {
            return errors
                .first_message()
                .unwrap_or(message.as_str())
                .to_string();
        }
        self.message_or("Something went wrong. Please try again.")
    }

    /// Field errors of a 422 response (empty for every other error).
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

/// Field-keyed validation messages, in the order the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(String, Vec<String>)>);

impl FieldErrors {
    /// Add a message for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        if let Some((_, messages)) = self.0.iter_mut().find(|(name, _)| name == field) {
            messages.push(message.into());
        } else {
            self.0.push((field.to_string(), vec![message.into()]));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First message for `field`, also matching nested keys like `sizes.0`.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|(name, _)| {
                name == field
                    || name
                        .strip_prefix(field)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .find_map(|(_, messages)| messages.first())
            .map(String::as_str)
    }

    /// First message of the first field.
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.0
            .iter()
            .find_map(|(_, messages)| messages.first())
            .map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for FieldErrors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Messages {
            One(String),
            Many(Vec<String>),
        }

        struct FieldErrorsVisitor;

        impl<'de> Visitor<'de> for FieldErrorsVisitor {
            type Value = FieldErrors;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of field names to messages")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Vec::new();
                while let Some((field, messages)) = map.next_entry::<String, Messages>()? {
                    let messages = match messages {
                        Messages::One(message) => vec![message],
                        Messages::Many(messages) => messages,
                    };
                    fields.push((field, messages));
                }
                Ok(FieldErrors(fields))
            }
        }

        deserializer.deserialize_map(FieldErrorsVisitor)
    }
}
