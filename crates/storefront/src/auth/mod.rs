//! Customer authentication.
//!
//! Login and registration exchange credentials for a token at the backend
//! and persist the token and user profile in the session store. Logout tells
//! the backend when it can, and always clears the local session.

mod error;

pub use error::AuthError;

use std::fmt;

use serde_json::json;
use tracing::{info, instrument, warn};

use linemart_core::{Email, StoredUser, UserRole};

use crate::api::types::AuthResponse;
use crate::api::{ApiClient, ApiError, ApiRequest, CUSTOMER_TOKEN_KEYS};
use crate::session;

const LOGIN_PATH: &str = "auth/customer/login/";
const REGISTER_PATH: &str = "auth/customer/register/";
const LOGOUT_PATH: &str = "auth/logout/";

/// Minimum username length.
const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Sign-up form contents.
#[derive(Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RegistrationForm {
    /// Check the form the way the sign-up screen does before submitting.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` describing the first problem.
    pub fn validate(&self) -> Result<(), AuthError> {
        let invalid = |msg: &str| Err(AuthError::InvalidInput(msg.to_string()));

        if self.first_name.trim().is_empty() {
            return invalid("First name is required");
        }
        if self.last_name.trim().is_empty() {
            return invalid("Last name is required");
        }
        if self.email.trim().is_empty() {
            return invalid("Email is required");
        }
        if Email::parse(&self.email).is_err() {
            return invalid("Please enter a valid email address");
        }
        if self.phone.trim().is_empty() {
            return invalid("Phone number is required");
        }
        if self.username.trim().is_empty() {
            return invalid("Username is required");
        }
        if self.username.trim().chars().count() < MIN_USERNAME_LENGTH {
            return invalid("Username must be at least 3 characters long");
        }
        if self.password.is_empty() {
            return invalid("Password is required");
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return invalid("Password must be at least 6 characters long");
        }
        if self.password != self.confirm_password {
            return invalid("Passwords do not match");
        }
        Ok(())
    }

    fn body(&self) -> serde_json::Value {
        json!({
            "username": self.username.trim(),
            "email": self.email.trim(),
            "password": self.password,
            "first_name": self.first_name.trim(),
            "last_name": self.last_name.trim(),
            "phone": self.phone.trim(),
        })
    }
}

/// Customer authentication service.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    /// Create an auth service over a customer API client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidInput` if either field is blank
    /// - `AuthError::Rejected` with the server's message, or `Login failed`
    /// - `AuthError::Network` if the backend is unreachable
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<StoredUser, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Please enter your username and password".to_string(),
            ));
        }
        let request = ApiRequest::post(LOGIN_PATH)
            .anonymous()
            .json(json!({ "username": username.trim(), "password": password }));
        self.authenticate(request, "Login failed").await
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidInput` if the form fails validation
    /// - `AuthError::Rejected` with the server's message, or `Registration failed`
    /// - `AuthError::Network` if the backend is unreachable
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<StoredUser, AuthError> {
        form.validate()?;
        let request = ApiRequest::post(REGISTER_PATH)
            .anonymous()
            .json(form.body());
        self.authenticate(request, "Registration failed").await
    }

    async fn authenticate(
        &self,
        request: ApiRequest,
        failure_message: &str,
    ) -> Result<StoredUser, AuthError> {
        let response: AuthResponse = self
            .client
            .call_as(request)
            .await
            .map_err(|e| auth_failure(e, failure_message))?;

        let user = StoredUser {
            id: response.user_id,
            username: response.username,
            email: response.email,
            role: response.role,
        };
        session::save_login(self.client.session().as_ref(), &response.token, &user)?;
        info!(user_id = %user.id, role = %user.role, "Signed in");
        Ok(user)
    }

    /// Sign out.
    ///
    /// The backend is told when a token is stored, but its answer does not
    /// matter: the local token and profile are removed either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` only if the local session cannot be cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let store = self.client.session();
        if session::find_token(store.as_ref(), CUSTOMER_TOKEN_KEYS).is_some()
            && let Err(e) = self.client.call(ApiRequest::post(LOGOUT_PATH)).await
        {
            warn!(error = %e, "Logout request failed, clearing local session anyway");
        }
        session::clear_login(store.as_ref())?;
        info!("Signed out");
        Ok(())
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<StoredUser> {
        session::load_user(self.client.session().as_ref())
    }

    /// Whether both a token and a user profile are stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let store = self.client.session();
        session::find_token(store.as_ref(), CUSTOMER_TOKEN_KEYS).is_some()
            && session::load_user(store.as_ref()).is_some()
    }

    fn has_role(&self, role: UserRole) -> bool {
        self.current_user().is_some_and(|user| user.role == role)
    }

    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.has_role(UserRole::Customer)
    }

    #[must_use]
    pub fn is_cashier(&self) -> bool {
        self.has_role(UserRole::Cashier)
    }

    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.has_role(UserRole::Manager)
    }
}

fn auth_failure(error: ApiError, failure_message: &str) -> AuthError {
    match error {
        ApiError::Http { .. } => AuthError::Rejected(
            error
                .server_message()
                .unwrap_or(failure_message)
                .to_string(),
        ),
        ApiError::Network(_) => AuthError::Network(error),
        other => AuthError::Response(other),
    }
}
