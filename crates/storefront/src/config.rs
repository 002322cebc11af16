//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `LINEMART_API_BASE_URL` - REST backend base URL (default: `http://localhost:8000/api`)
//! - `LINEMART_SESSION_FILE` - Session store file (default: `<data dir>/linemart/session.json`)
//! - `LINEMART_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `LINEMART_POLL_PRODUCTS_SECS` - Product refresh interval (default: 8)
//! - `LINEMART_POLL_CATEGORIES_SECS` - Category refresh interval (default: 30)
//! - `LINEMART_POLL_ADVERTISEMENTS_SECS` - Advertisement refresh interval (default: 60)
//! - `LINEMART_POLL_DEFAULT_SECS` - Interval for every other data type (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::realtime::DataType;

/// Default REST backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Could not determine a data directory for the session file; set LINEMART_SESSION_FILE")]
    NoDataDir,
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// REST backend base URL, always ending in `/`
    pub api_base_url: Url,
    /// Where the session store persists the token and user profile
    pub session_file: PathBuf,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Polling intervals per data type
    pub polling: PollingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Refresh intervals for polled data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub products: Duration,
    pub categories: Duration,
    pub advertisements: Duration,
    /// Interval for every other data type.
    pub default: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            products: Duration::from_secs(8),
            categories: Duration::from_secs(30),
            advertisements: Duration::from_secs(60),
            default: Duration::from_secs(30),
        }
    }
}

impl PollingConfig {
    /// Interval configured for a data type.
    #[must_use]
    pub const fn interval_for(&self, data_type: DataType) -> Duration {
        match data_type {
            DataType::ProductUpdates => self.products,
            DataType::CategoryUpdates => self.categories,
            DataType::Advertisements => self.advertisements,
            _ => self.default,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            products: get_positive_secs("LINEMART_POLL_PRODUCTS_SECS", defaults.products)?,
            categories: get_positive_secs("LINEMART_POLL_CATEGORIES_SECS", defaults.categories)?,
            advertisements: get_positive_secs(
                "LINEMART_POLL_ADVERTISEMENTS_SECS",
                defaults.advertisements,
            )?,
            default: get_positive_secs("LINEMART_POLL_DEFAULT_SECS", defaults.default)?,
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value, or if
    /// no session file location can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "LINEMART_API_BASE_URL",
            &get_env_or_default("LINEMART_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let session_file = match get_optional_env("LINEMART_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };
        let request_timeout =
            get_positive_secs("LINEMART_REQUEST_TIMEOUT_SECS", Duration::from_secs(30))?;

        Ok(Self {
            api_base_url,
            session_file,
            request_timeout,
            polling: PollingConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_base_url`, with every other value at
    /// its default. Used by tests and embedding applications.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL does not parse.
    pub fn for_base_url(api_base_url: &str, session_file: PathBuf) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("api_base_url", api_base_url)?,
            session_file,
            request_timeout: Duration::from_secs(30),
            polling: PollingConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a duration in whole seconds. Zero is rejected.
fn get_positive_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    positive_secs(key, get_parsed(key, default.as_secs())?)
}

fn positive_secs(key: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse a base URL and make sure it ends in `/` so endpoint joins append.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `<data-local-dir>/linemart/session.json`.
fn default_session_file() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("linemart").join("session.json"))
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("TEST", "http://localhost:8000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
        assert_eq!(
            url.join("customer/products/").unwrap().as_str(),
            "http://localhost:8000/api/customer/products/"
        );
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("TEST", "http://shop.test/api/").unwrap();
        assert_eq!(url.as_str(), "http://shop.test/api/");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let err = parse_base_url("TEST", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(parse_base_url("TEST", "mailto:shop@linemart.test").is_err());
    }

    #[test]
    fn test_polling_intervals_by_data_type() {
        let polling = PollingConfig::default();
        assert_eq!(
            polling.interval_for(DataType::ProductUpdates),
            Duration::from_secs(8)
        );
        assert_eq!(
            polling.interval_for(DataType::CategoryUpdates),
            Duration::from_secs(30)
        );
        assert_eq!(
            polling.interval_for(DataType::Advertisements),
            Duration::from_secs(60)
        );
        assert_eq!(
            polling.interval_for(DataType::Notifications),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_zero_seconds_rejected() {
        let err = positive_secs("LINEMART_REQUEST_TIMEOUT_SECS", 0).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "LINEMART_REQUEST_TIMEOUT_SECS")
        );
        assert_eq!(
            positive_secs("LINEMART_REQUEST_TIMEOUT_SECS", 15).unwrap(),
            Duration::from_secs(15)
        );
    }

    #[test]
    fn test_for_base_url_uses_defaults() {
        let config =
            StorefrontConfig::for_base_url("http://127.0.0.1:9000/api", PathBuf::from("s.json"))
                .unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:9000/api/");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.polling, PollingConfig::default());
        assert!(config.sentry_dsn.is_none());
    }
}
