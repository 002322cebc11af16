//! Signed-in account data persisted next to the auth token.

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::status::UserRole;

/// The user profile kept in the session store after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: UserRole,
}
