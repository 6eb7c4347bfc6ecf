//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_BASE_URL` - Base URL of the shop REST API (e.g. `https://api.xtremefit.test`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STORAGE_URL` - Base URL for product images (default: `<API base>/storage`)
//! - `STOREFRONT_API_TIMEOUT_SECS` - Per-request API timeout (default: 15)
//! - `STOREFRONT_CATALOG_CACHE_SECS` - Product/category cache TTL (default: 60)
//! - `STOREFRONT_SESSION_REVALIDATE_SECS` - How often the session token is re-checked (default: 300)
//! - `STOREFRONT_RATE_LIMIT` - Rate limit login/register (default: true)
//! - `STOREFRONT_LOG_JSON` - Emit JSON log lines instead of text (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Base URL of the REST API, without a trailing slash
    pub api_base_url: String,
    /// Base URL that relative image paths are joined to, without a trailing slash
    pub storage_url: String,
    /// Timeout applied to every API request
    pub api_timeout: Duration,
    /// How long catalog reads stay cached
    pub catalog_cache_ttl: Duration,
    /// Minimum time between two `GET /api/user` checks of the same session
    pub session_revalidate_interval: Duration,
    /// Whether login and registration are rate limited
    pub rate_limit: bool,
    /// Emit JSON log lines for log shippers
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment (production, staging, ...)
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("api_base_url", &self.api_base_url)
            .field("storage_url", &self.storage_url)
            .field("api_timeout", &self.api_timeout)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .field(
                "session_revalidate_interval",
                &self.session_revalidate_interval,
            )
            .field("rate_limit", &self.rate_limit)
            .field("log_json", &self.log_json)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env
            .get_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = env.parse_or_default("STOREFRONT_PORT", 3000u16)?;
        let base_url = env.get_http_url("STOREFRONT_BASE_URL")?;
        let api_base_url = env.get_http_url("STOREFRONT_API_BASE_URL")?;

        let storage_url = match env.get_optional("STOREFRONT_STORAGE_URL") {
            Some(raw) => parse_http_url("STOREFRONT_STORAGE_URL", &raw)?,
            None => format!("{api_base_url}/storage"),
        };

        let api_timeout = Duration::from_secs(env.parse_or_default("STOREFRONT_API_TIMEOUT_SECS", 15)?);
        let catalog_cache_ttl =
            Duration::from_secs(env.parse_or_default("STOREFRONT_CATALOG_CACHE_SECS", 60)?);
        let session_revalidate_interval = Duration::from_secs(
            env.parse_or_default("STOREFRONT_SESSION_REVALIDATE_SECS", 300)?,
        );
        let rate_limit = env.flag_or_default("STOREFRONT_RATE_LIMIT", true)?;
        let log_json = env.flag_or_default("STOREFRONT_LOG_JSON", false)?;

        let sentry_dsn = env.get_optional("SENTRY_DSN").map(SecretString::from);
        let sentry_environment = env.get_optional("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            base_url,
            api_base_url,
            storage_url,
            api_timeout,
            catalog_cache_ttl,
            session_revalidate_interval,
            rate_limit,
            log_json,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Origin of the image storage host, for the CSP `img-src` directive.
    #[must_use]
    pub fn storage_origin(&self) -> Option<String> {
        Url::parse(&self.storage_url)
            .ok()
            .map(|url| url.origin().ascii_serialization())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional environment variable, treating blank values as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Get a required environment variable.
    fn get_required(&self, key: &str) -> Result<String, ConfigError> {
        self.get_optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an environment variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Parse an environment variable, falling back to `default` when unset.
    fn parse_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_optional(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse an on/off switch (`true`/`false`, `1`/`0`, `yes`/`no`).
    fn flag_or_default(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get_optional(key) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got {raw}"),
            )),
        }
    }

    /// Get a required `http(s)` URL, normalized without a trailing slash.
    fn get_http_url(&self, key: &str) -> Result<String, ConfigError> {
        let raw = self.get_required(key)?;
        parse_http_url(key, &raw)
    }
}

fn parse_http_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected an http(s) URL, got scheme {}", url.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("STOREFRONT_API_BASE_URL", "https://api.xtremefit.test/"),
        ("STOREFRONT_BASE_URL", "https://shop.xtremefit.test"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.api_base_url, "https://api.xtremefit.test");
        assert_eq!(config.storage_url, "https://api.xtremefit.test/storage");
        assert_eq!(config.api_timeout, Duration::from_secs(15));
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.session_revalidate_interval, Duration::from_secs(300));
        assert!(config.rate_limit);
        assert!(!config.log_json);
        assert!(config.is_secure());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_api_base_url() {
        let err = load(&[("STOREFRONT_BASE_URL", "http://localhost:3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "STOREFRONT_API_BASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("STOREFRONT_PORT", "not-a-port"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"
        ));

        let vars = [
            ("STOREFRONT_API_BASE_URL", "ftp://api.xtremefit.test"),
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
        ];
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_API_BASE_URL"
        ));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("STOREFRONT_STORAGE_URL", "https://cdn.xtremefit.test/images/"),
            ("STOREFRONT_SESSION_REVALIDATE_SECS", "0"),
            ("STOREFRONT_RATE_LIMIT", "false"),
            ("STOREFRONT_PORT", "8080"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.storage_url, "https://cdn.xtremefit.test/images");
        assert_eq!(
            config.storage_origin().as_deref(),
            Some("https://cdn.xtremefit.test")
        );
        assert_eq!(config.session_revalidate_interval, Duration::ZERO);
        assert!(!config.rate_limit);
        assert_eq!(config.socket_addr().port(), 8080);
    }

    #[test]
    fn test_log_json_switch() {
        let cases = [
            ("1", true),
            ("TRUE", true),
            ("yes", true),
            ("0", false),
            ("false", false),
        ];
        for (raw, expected) in cases {
            let mut vars = REQUIRED.to_vec();
            vars.push(("STOREFRONT_LOG_JSON", raw));
            assert_eq!(load(&vars).unwrap().log_json, expected, "{raw}");
        }

        let mut vars = REQUIRED.to_vec();
        vars.push(("STOREFRONT_LOG_JSON", "loud"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_LOG_JSON"
        ));
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SENTRY_DSN", "https://super-secret-key@sentry.test/1"));
        let config = load(&vars).unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-key"));
    }
}
