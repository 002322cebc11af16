//! Persisted session state: the auth token and signed-in user profile.
//!
//! Values are plain strings stored under fixed keys. The user profile is kept
//! as a JSON document under [`keys::CUSTOMER_USER`]. The store is injected
//! wherever it is needed; nothing reads it as an ambient global.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use linemart_core::StoredUser;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, warn};

/// Session keys for authentication data.
pub mod keys {
    /// Token issued by the customer login/register endpoints.
    pub const CUSTOMER_TOKEN: &str = "customer_token";

    /// JSON-encoded [`StoredUser`](linemart_core::StoredUser).
    pub const CUSTOMER_USER: &str = "customer_user";

    /// Token left behind by a cashier session on the same machine.
    pub const CASHIER_TOKEN: &str = "cashier_token";

    /// Token left behind by a manager session on the same machine.
    pub const MANAGER_TOKEN: &str = "manager_token";
}

/// Errors from reading or writing the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string key-value store that survives restarts.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Delete a value. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// First token present under any of `token_keys`, in order.
pub fn find_token(store: &dyn SessionStore, token_keys: &[&str]) -> Option<SecretString> {
    token_keys
        .iter()
        .find_map(|key| store.get(key).filter(|t| !t.is_empty()))
        .map(SecretString::from)
}

/// Decode the stored user profile, if any.
///
/// A profile that no longer decodes is treated as absent.
pub fn load_user(store: &dyn SessionStore) -> Option<StoredUser> {
    let raw = store.get(keys::CUSTOMER_USER)?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable stored user profile");
            None
        }
    }
}

/// Persist a token and user profile after login or registration.
///
/// # Errors
///
/// Returns an error if either value cannot be written.
pub fn save_login(
    store: &dyn SessionStore,
    token: &str,
    user: &StoredUser,
) -> Result<(), SessionError> {
    store.set(keys::CUSTOMER_TOKEN, token)?;
    store.set(keys::CUSTOMER_USER, &serde_json::to_string(user)?)
}

/// Remove the customer token and profile.
///
/// # Errors
///
/// Returns an error if the change cannot be persisted.
pub fn clear_login(store: &dyn SessionStore) -> Result<(), SessionError> {
    store.remove(keys::CUSTOMER_TOKEN)?;
    store.remove(keys::CUSTOMER_USER)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// MemorySessionStore
// =============================================================================

/// Session store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

// =============================================================================
// FileSessionStore
// =============================================================================

/// Session store backed by a JSON object on disk.
///
/// The file is read once on open. Every change rewrites it through a
/// temporary file and a rename so a crash never leaves half a document.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = values.len(), "Opened session store");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let written = Self::write_file(&tmp, values).and_then(|()| {
            fs::rename(&tmp, &self.path)?;
            Ok(())
        });
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }

    fn write_file(path: &Path, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let mut file = fs::File::create(path)?;
        file.write_all(serde_json::to_string_pretty(values)?.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = lock(&self.values);
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = lock(&self.values);
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}
