//! Unified error handling with Sentry integration.
//!
//! Every library concern has its own error enum; front ends work with
//! [`AppError`], which wraps them all and knows how to report itself.

use thiserror::Error;

use linemart_core::CheckoutError;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::checkout::PlaceOrderError;
use crate::config::ConfigError;
use crate::realtime::PollingError;
use crate::session::SessionError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Login, registration or logout failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// The session store could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// A polling subscription could not be started.
    #[error("Polling error: {0}")]
    Polling(#[from] PollingError),

    /// A checkout step was rejected.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    /// An order could not be placed.
    #[error("{0}")]
    PlaceOrder(#[from] PlaceOrderError),

    /// The user asked for something that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Text to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) | Self::PlaceOrder(PlaceOrderError::Api(e)) => e.user_message(),
            other => other.to_string(),
        }
    }

    /// Whether this error points at a defect or an outage rather than at
    /// something the user did.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Config(_) | Self::Session(_) | Self::Polling(_) => true,
            Self::Api(e) => !matches!(e, ApiError::Http { status, .. } if status.is_client_error()),
            Self::Auth(AuthError::Response(_) | AuthError::Session(_)) => true,
            _ => false,
        }
    }

    /// Log the error, sending unexpected ones to Sentry.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Storefront error");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
    }
}
