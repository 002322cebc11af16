//! Integration test support for the LineMart storefront.
//!
//! [`MockBackend`] is an in-process stand-in for the LineMart REST API. It
//! listens on an ephemeral localhost port, answers each `(method, path)` with
//! a canned response and records every request it receives, so tests can
//! drive the real storefront clients over real HTTP and then inspect what
//! was sent.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! backend.respond_json(Method::GET, "/api/customer/categories/", StatusCode::OK, json!([]));
//!
//! let shell = backend.shell();
//! let categories = shell.catalog().categories().await.unwrap();
//! assert_eq!(backend.requests_to("/api/customer/categories/").len(), 1);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use linemart_storefront::AppShell;
use linemart_storefront::config::StorefrontConfig;
use linemart_storefront::session::{MemorySessionStore, SessionStore};

pub use axum::http;

/// Path prefix the storefront clients are pointed at.
pub const API_PREFIX: &str = "/api";

// =============================================================================
// Recorded requests
// =============================================================================

/// A request as the mock backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl RecordedRequest {
    /// A header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decoded query string pairs, in order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| {
                q.split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| {
                        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                        (key.to_string(), value.replace('+', " "))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first value of a query parameter.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }
}

// =============================================================================
// Canned responses
// =============================================================================

#[derive(Debug, Clone)]
struct Canned {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

impl IntoResponse for Canned {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        response
    }
}

#[derive(Default)]
struct BackendState {
    routes: Mutex<HashMap<(Method, String), Canned>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    lock(&state.requests).push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body: serde_json::from_slice(&body).ok(),
    });

    let canned = lock(&state.routes).get(&(method, path)).cloned();
    match canned {
        Some(canned) => canned.into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "detail": "Not found." })),
        )
            .into_response(),
    }
}

// =============================================================================
// MockBackend
// =============================================================================

/// In-process mock of the LineMart REST API.
///
/// The server task is aborted when the backend is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral localhost port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");

        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Self { addr, state, task }
    }

    /// Base URL the storefront should be configured with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}{API_PREFIX}/", self.addr)
    }

    /// Storefront configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the base URL is always well formed.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::for_base_url(&self.base_url(), PathBuf::from("unused-session.json"))
            .expect("mock backend URL parses")
    }

    /// An app shell over a fresh in-memory session.
    #[must_use]
    pub fn shell(&self) -> AppShell {
        self.shell_with_session(Arc::new(MemorySessionStore::new()))
    }

    /// An app shell over the given session store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP clients cannot be built.
    #[must_use]
    pub fn shell_with_session(&self, session: Arc<dyn SessionStore>) -> AppShell {
        AppShell::with_session(self.config(), session).expect("build app shell")
    }

    /// Answer `method path` with a JSON body.
    pub fn respond_json(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        body: serde_json::Value,
    ) {
        self.respond(method, path, status, "application/json", body.to_string());
    }

    /// Answer `method path` with a plain-text body.
    pub fn respond_text(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        self.respond(method, path, status, "text/plain", body.to_string());
    }

    fn respond(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        content_type: &'static str,
        body: String,
    ) {
        lock(&self.state.routes).insert(
            (method, path.to_string()),
            Canned {
                status,
                content_type,
                body,
            },
        );
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Requests received for `path`, any method.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A localhost URL with nothing listening on it.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe port");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}{API_PREFIX}/")
}

/// JSON product record in the shape the backend serves.
#[must_use]
pub fn product_json(id: i64, name: &str, price: &str, category: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "image": format!("/media/products/{id}.jpg"),
        "category_name": category,
        "description": format!("{name} from the LineMart shelf"),
        "stock": 12,
    })
}
