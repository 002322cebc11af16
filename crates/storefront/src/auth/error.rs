//! Authentication error types.

use thiserror::Error;

use crate::session::SessionError;

/// Errors that can occur during login, registration or logout.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The form failed local validation.
    #[error("{0}")]
    InvalidInput(String),

    /// The backend rejected the request. Carries the text to show the user.
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("Network error. Please try again.")]
    Network(#[source] crate::api::ApiError),

    /// The backend answered with something other than a login response.
    #[error("unexpected authentication response: {0}")]
    Response(#[source] crate::api::ApiError),

    /// The token or profile could not be persisted.
    #[error("session store error: {0}")]
    Session(#[from] SessionError),
}
