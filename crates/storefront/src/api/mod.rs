//! REST client for the LineMart backend.
//!
//! # Architecture
//!
//! - [`ApiClient`] turns an [`ApiRequest`] into one HTTP call, attaches the
//!   session token, and normalizes the outcome into JSON or an [`ApiError`]
//! - [`CustomerApi`] names every customer-scoped endpoint and decodes the
//!   responses into domain types
//! - [`FallbackApi`] retries products, categories and advertisements once
//!   against the legacy cashier endpoints
//!
//! The client never retries on its own, caches, or deduplicates in-flight
//! requests. Every call is independent.
//!
//! # Example
//!
//! ```rust,ignore
//! use linemart_storefront::api::{ApiClient, CustomerApi, ProductQuery};
//!
//! let client = ApiClient::new(&config, session)?;
//! let customer = CustomerApi::new(client);
//! let products = customer.products(&ProductQuery::search("milk")).await?;
//! ```

mod conversions;
mod customer;
mod fallback;
pub mod types;

pub use customer::{CustomerApi, ProductQuery};
pub use fallback::FallbackApi;

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::session::{self, SessionStore, keys};

/// Header carrying a per-request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tokens the customer client sends, in lookup order.
pub const CUSTOMER_TOKEN_KEYS: &[&str] = &[keys::CUSTOMER_TOKEN];

/// Tokens the realtime client sends, in lookup order.
///
/// Polling also works when only a staff member is signed in on the device.
pub const REALTIME_TOKEN_KEYS: &[&str] = &[
    keys::CUSTOMER_TOKEN,
    keys::CASHIER_TOKEN,
    keys::MANAGER_TOKEN,
];

/// Message shown to the user for transport failures.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: StatusCode,
        /// Server-supplied message, or `HTTP <status>`.
        message: String,
    },

    /// The request never produced a response (DNS, timeout, refused).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// A success response carried a body that could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The endpoint path could not be joined onto the base URL.
    #[error("Invalid endpoint {path}: {source}")]
    InvalidEndpoint {
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Setup(#[source] reqwest::Error),
}

impl ApiError {
    /// Text to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Self::Decode(_) | Self::InvalidEndpoint { .. } | Self::Setup(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// HTTP status of an error response.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message supplied by the server, if the error body carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { status, message } if *message != generic_message(*status) => {
                Some(message)
            }
            _ => None,
        }
    }

    /// Whether the request failed below HTTP.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

// =============================================================================
// ApiRequest
// =============================================================================

/// A logical request: endpoint path, query, optional JSON body, method.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    anonymous: bool,
}

impl ApiRequest {
    /// A request with an explicit method.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter only when `value` is present and non-empty.
    #[must_use]
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value.map(|v| v.to_string()).filter(|v| !v.is_empty()) {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send without the session token, even when one is stored.
    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute URL for this request under `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] if the path does not join.
    pub fn url(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base
            .join(self.path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidEndpoint {
                path: self.path.clone(),
                source,
            })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// HTTP client for the backend.
///
/// Cheaply cloneable; clones share one connection pool and session store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
    token_keys: &'static [&'static str],
}

impl ApiClient {
    /// Create a client that authenticates with the customer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Setup`] if the HTTP client fails to build.
    pub fn new(
        config: &StorefrontConfig,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        Self::with_token_keys(config, session, CUSTOMER_TOKEN_KEYS)
    }

    /// Create a client that sends the first token found under `token_keys`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Setup`] if the HTTP client fails to build.
    pub fn with_token_keys(
        config: &StorefrontConfig,
        session: Arc<dyn SessionStore>,
        token_keys: &'static [&'static str],
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::Setup)?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
                session,
                token_keys,
            }),
        })
    }

    /// Base URL every endpoint path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The session store tokens are read from.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }

    /// Perform a request and return the JSON body.
    ///
    /// A success response without a JSON content type yields an empty object.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] for non-2xx responses
    /// - [`ApiError::Network`] when no response arrives
    /// - [`ApiError::Decode`] when a JSON success body does not parse
    #[instrument(
        skip(self, request),
        fields(method = %request.method, endpoint = %request.path, request_id)
    )]
    pub async fn call(&self, request: ApiRequest) -> Result<serde_json::Value, ApiError> {
        let url = request.url(&self.inner.base_url)?;
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut builder = self
            .inner
            .client
            .request(request.method.clone(), url)
            .header(REQUEST_ID_HEADER, &request_id);

        let token = if request.anonymous {
            None
        } else {
            session::find_token(self.inner.session.as_ref(), self.inner.token_keys)
        };
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Token {}", token.expose_secret()));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            debug!(error = %e, "Request failed before a response arrived");
            ApiError::Network(e)
        })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        let body = response.bytes().await.map_err(ApiError::Network)?;

        if !status.is_success() {
            let message = error_message(status, &body);
            debug!(status = %status, message = %message, "Backend returned an error");
            return Err(ApiError::Http { status, message });
        }

        if !is_json || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Perform a request and decode the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::call`], plus [`ApiError::Decode`] if the body does not
    /// match `T`.
    pub async fn call_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let value = self.call(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `GET` an endpoint and decode the body into `T`.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::call_as`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: impl Into<String> + Send,
    ) -> Result<T, ApiError> {
        self.call_as(ApiRequest::get(path)).await
    }
}

/// Pick the server's `error` field, else `message`, else `HTTP <status>`.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .filter_map(|key| v.get(key))
                .find_map(|field| match field {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(s) if s.is_empty() => None,
                    serde_json::Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
        })
        .unwrap_or_else(|| generic_message(status))
}

fn generic_message(status: StatusCode) -> String {
    format!("HTTP {}", status.as_u16())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        let body = br#"{"error": "Out of stock", "message": "ignored"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Out of stock"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_message_field() {
        let body = br#"{"message": "Token expired"}"#;
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, body),
            "Token expired"
        );
    }

    #[test]
    fn test_error_message_generic_when_body_unhelpful() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, b"<html>Not Found</html>"),
            "HTTP 404"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, br#"{"error": ""}"#),
            "HTTP 500"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, b""), "HTTP 502");

        let generic = ApiError::Http {
            status: StatusCode::BAD_GATEWAY,
            message: error_message(StatusCode::BAD_GATEWAY, b""),
        };
        assert_eq!(generic.server_message(), None);
    }

    #[test]
    fn test_request_url_joins_path_and_query() {
        let base = Url::parse("http://localhost:8000/api/").unwrap();
        let request = ApiRequest::get("/customer/products/")
            .query("search", "oat milk")
            .query_opt("category", Some(3))
            .query_opt("page", None::<u32>);
        assert_eq!(
            request.url(&base).unwrap().as_str(),
            "http://localhost:8000/api/customer/products/?search=oat+milk&category=3"
        );
    }

    #[test]
    fn test_request_url_without_query_has_no_question_mark() {
        let base = Url::parse("http://localhost:8000/api/").unwrap();
        let url = ApiRequest::get("customer/cart/").url(&base).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/customer/cart/");
    }

    #[test]
    fn test_user_message_for_http_error() {
        let err = ApiError::Http {
            status: StatusCode::CONFLICT,
            message: "Already reviewed".to_string(),
        };
        assert_eq!(err.user_message(), "Already reviewed");
        assert_eq!(err.server_message(), Some("Already reviewed"));
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert!(!err.is_network());
    }
}
