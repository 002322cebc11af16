//! Application shell shared by the dashboard binary and the CLI.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::api::{ApiClient, CustomerApi, FallbackApi};
use crate::auth::AuthService;
use crate::checkout::CheckoutService;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::realtime::{PollingManager, RealtimeApi};
use crate::session::{FileSessionStore, SessionStore};

/// Everything a storefront front end needs, constructed once.
///
/// Cheaply cloneable via `Arc`. Owns the session store, the API clients and
/// the polling manager; consumers receive it explicitly rather than reaching
/// for globals.
#[derive(Clone)]
pub struct AppShell {
    inner: Arc<AppShellInner>,
}

struct AppShellInner {
    config: StorefrontConfig,
    session: Arc<dyn SessionStore>,
    customer: CustomerApi,
    catalog: FallbackApi,
    auth: AuthService,
    polling: PollingManager<RealtimeApi>,
    unmounted: AtomicBool,
}

impl AppShell {
    /// Create a shell backed by the session file named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file is unreadable or the HTTP
    /// clients cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, AppError> {
        let session = Arc::new(FileSessionStore::open(&config.session_file)?);
        Self::with_session(config, session)
    }

    /// Create a shell over an existing session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be built.
    pub fn with_session(
        config: StorefrontConfig,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, AppError> {
        let client = ApiClient::new(&config, Arc::clone(&session))?;
        let customer = CustomerApi::new(client.clone());
        let catalog = FallbackApi::new(customer.clone());
        let auth = AuthService::new(client);
        let realtime = RealtimeApi::new(&config, Arc::clone(&session))?;
        let polling = PollingManager::new(realtime, config.polling);

        info!(api_base_url = %config.api_base_url, "Storefront shell created");

        Ok(Self {
            inner: Arc::new(AppShellInner {
                config,
                session,
                customer,
                catalog,
                auth,
                polling,
                unmounted: AtomicBool::new(false),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }

    /// Customer endpoints.
    #[must_use]
    pub fn customer(&self) -> &CustomerApi {
        &self.inner.customer
    }

    /// Catalog reads with the cashier fallback.
    #[must_use]
    pub fn catalog(&self) -> &FallbackApi {
        &self.inner.catalog
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn polling(&self) -> &PollingManager<RealtimeApi> {
        &self.inner.polling
    }

    /// Order placement for checkouts.
    #[must_use]
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(self.inner.customer.clone())
    }

    /// Stop all polling. Safe to call repeatedly.
    pub fn unmount(&self) {
        if self.inner.unmounted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.polling.stop_all();
        info!("Storefront shell unmounted");
    }

    /// Whether [`AppShell::unmount`] has run.
    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.inner.unmounted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::realtime::DataType;
    use crate::session::MemorySessionStore;

    fn shell() -> AppShell {
        let config =
            StorefrontConfig::for_base_url("http://127.0.0.1:9/api", PathBuf::from("unused.json"))
                .unwrap();
        AppShell::with_session(config, Arc::new(MemorySessionStore::new())).unwrap()
    }

    #[tokio::test]
    async fn test_unmount_stops_polling_and_is_idempotent() {
        let shell = shell();
        shell
            .polling()
            .start(DataType::Deals, |_| {}, Duration::from_secs(3600))
            .unwrap();
        assert!(!shell.polling().active().is_empty());

        shell.unmount();
        assert!(shell.polling().active().is_empty());
        assert!(shell.is_unmounted());
        shell.unmount();
        assert!(shell.is_unmounted());
    }

    #[test]
    fn test_shell_starts_signed_out() {
        let shell = shell();
        assert!(!shell.auth().is_authenticated());
        assert!(shell.auth().current_user().is_none());
    }
}
