//! Customer dashboard state.
//!
//! The dashboard owns what the customer screen shows: catalog, merchandising,
//! orders, notifications and the local cart. [`Dashboard::mount`] performs
//! the initial loads and subscribes to catalog polling; polled data is merged
//! into the shared state as it arrives.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use linemart_core::catalog::{self, ALL_CATEGORIES};
use linemart_core::{
    Advertisement, Cart, Category, CheckoutTotals, Deal, Notification, NotificationId, Order,
    Product, ProductId, Promotion, RemoteCart,
};

use crate::realtime::{DataSource, DataType, PollData, PollingError, PollingHandle, PollingManager};

/// Banner shown when the initial product load fails.
pub const PRODUCTS_LOAD_ERROR: &str = "Failed to load products. Please try again.";

/// Banner shown when the initial category load fails.
pub const CATEGORIES_LOAD_ERROR: &str = "Failed to load categories. Please try again.";

/// Data types the dashboard keeps fresh by polling.
pub const POLLED_TYPES: [DataType; 3] = [
    DataType::ProductUpdates,
    DataType::CategoryUpdates,
    DataType::Advertisements,
];

/// Data types loaded once on mount.
const INITIAL_LOADS: [DataType; 7] = [
    DataType::ProductUpdates,
    DataType::CategoryUpdates,
    DataType::Advertisements,
    DataType::Promotions,
    DataType::Deals,
    DataType::Orders,
    DataType::Notifications,
];

/// Everything the dashboard displays.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub advertisements: Vec<Advertisement>,
    pub promotions: Vec<Promotion>,
    pub deals: Vec<Deal>,
    pub orders: Vec<Order>,
    pub notifications: Vec<Notification>,
    pub remote_cart: RemoteCart,
    pub cart: Cart,
    pub selected_category: String,
    pub error: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            categories: Vec::new(),
            advertisements: Vec::new(),
            promotions: Vec::new(),
            deals: Vec::new(),
            orders: Vec::new(),
            notifications: Vec::new(),
            remote_cart: RemoteCart::default(),
            cart: Cart::new(),
            selected_category: ALL_CATEGORIES.to_string(),
            error: None,
        }
    }
}

impl DashboardState {
    /// Merge a fetch result into the state.
    pub fn apply(&mut self, data: PollData) {
        match data {
            PollData::Products(products) => {
                self.products = products;
                self.clear_error(PRODUCTS_LOAD_ERROR);
            }
            PollData::Categories(categories) => {
                self.categories = categories;
                self.clear_error(CATEGORIES_LOAD_ERROR);
            }
            PollData::Advertisements(ads) => self.advertisements = ads,
            PollData::Promotions(promotions) => self.promotions = promotions,
            PollData::Deals(deals) => self.deals = deals,
            PollData::Orders(orders) => self.orders = orders,
            PollData::Notifications(notifications) => self.notifications = notifications,
            PollData::Cart(cart) => self.remote_cart = cart,
        }
    }

    fn clear_error(&mut self, banner: &str) {
        if self.error.as_deref() == Some(banner) {
            self.error = None;
        }
    }

    /// Category filter choices: `all` followed by every category name.
    #[must_use]
    pub fn category_options(&self) -> Vec<String> {
        catalog::category_options(&self.categories)
    }

    /// Products in the selected category.
    #[must_use]
    pub fn visible_products(&self) -> Vec<&Product> {
        catalog::filter_by_category(&self.products, &self.selected_category)
    }

    /// Notifications not yet read.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

/// Shared handle to the dashboard state. Clones share one state.
#[derive(Clone, Default)]
pub struct Dashboard {
    state: Arc<RwLock<DashboardState>>,
    subscriptions: Arc<Mutex<Vec<PollingHandle>>>,
}

impl Dashboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load initial data and start catalog polling.
    ///
    /// A failed product or category load shows an error banner; every other
    /// failed load leaves that section empty. Polling starts regardless, so
    /// a later successful cycle fills the gaps.
    ///
    /// # Errors
    ///
    /// Returns `PollingError` if a subscription cannot be started.
    pub async fn mount<S: DataSource>(
        &self,
        polling: &PollingManager<S>,
    ) -> Result<(), PollingError> {
        for data_type in INITIAL_LOADS {
            match polling.source().fetch(data_type).await {
                Ok(data) => self.apply(data),
                Err(e) => {
                    let banner = match data_type {
                        DataType::ProductUpdates => Some(PRODUCTS_LOAD_ERROR),
                        DataType::CategoryUpdates => Some(CATEGORIES_LOAD_ERROR),
                        _ => None,
                    };
                    if let Some(banner) = banner {
                        warn!(data_type = %data_type, error = %e, "Initial load failed");
                        self.write().error = Some(banner.to_string());
                    } else {
                        debug!(data_type = %data_type, error = %e, "Initial load failed");
                    }
                }
            }
        }

        let mut handles = Vec::with_capacity(POLLED_TYPES.len());
        for data_type in POLLED_TYPES {
            let state = Arc::clone(&self.state);
            let handle = polling.start_default(data_type, move |data| {
                state
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply(data);
            })?;
            handles.push(handle);
        }
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner);
        subscriptions.extend(handles);
        info!(polled = POLLED_TYPES.len(), "Dashboard mounted");
        Ok(())
    }

    /// Stop this dashboard's polling. Safe to call repeatedly.
    pub fn unmount(&self) {
        let handles: Vec<_> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if handles.is_empty() {
            return;
        }
        for handle in &handles {
            handle.cancel();
        }
        info!("Dashboard unmounted");
    }

    /// Merge a fetch result into the state.
    pub fn apply(&self, data: PollData) {
        self.write().apply(data);
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> DashboardState {
        self.read().clone()
    }

    /// Run `f` against the current state without copying it.
    pub fn with_state<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.read())
    }

    /// Current error banner, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Dismiss the error banner.
    pub fn clear_error(&self) {
        self.write().error = None;
    }

    /// Change the category filter.
    pub fn select_category(&self, category: impl Into<String>) {
        self.write().selected_category = category.into();
    }

    /// Add one unit of a listed product to the local cart.
    ///
    /// Returns `false` if the product is not in the current listing.
    pub fn add_to_cart(&self, product_id: ProductId) -> bool {
        let mut state = self.write();
        let Some(product) = state.products.iter().find(|p| p.id == product_id).cloned() else {
            return false;
        };
        state.cart.add(&product);
        true
    }

    /// Set a cart quantity; zero or less removes the line.
    pub fn update_quantity(&self, product_id: ProductId, quantity: i64) {
        self.write().cart.update_quantity(product_id, quantity);
    }

    pub fn remove_from_cart(&self, product_id: ProductId) {
        self.write().cart.remove(product_id);
    }

    /// Checkout amounts for the local cart.
    #[must_use]
    pub fn cart_totals(&self) -> CheckoutTotals {
        CheckoutTotals::for_cart(&self.read().cart)
    }

    /// Mark one notification as read. Unknown ids are ignored.
    pub fn mark_read(&self, id: NotificationId) {
        if let Some(notification) = self
            .write()
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
        {
            notification.read = true;
        }
    }

    pub fn mark_all_read(&self) {
        for notification in &mut self.write().notifications {
            notification.read = true;
        }
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.read().unread_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use linemart_core::{CategoryId, NotificationKind};
    use reqwest::StatusCode;
    use rust_decimal::Decimal;

    use super::*;
    use crate::api::ApiError;
    use crate::config::PollingConfig;

    fn product(id: i64, category: &str, price: Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Item {id}"),
            price,
            image: "/download.jpg".to_string(),
            category: category.to_string(),
            subcategory: String::new(),
            rating: 4.0,
            description: String::new(),
            stock: 5,
        }
    }

    fn notification(id: i64, read: bool) -> Notification {
        Notification {
            id: NotificationId::new(id),
            kind: NotificationKind::Info,
            message: format!("Message {id}"),
            time: "just now".to_string(),
            read,
        }
    }

    /// Serves a fixed catalog; product and category fetches can be failed.
    #[derive(Default)]
    struct FakeStore {
        fail_products: bool,
        fail_categories: bool,
        product_fetches: AtomicUsize,
    }

    impl DataSource for FakeStore {
        async fn fetch(&self, data_type: DataType) -> Result<PollData, ApiError> {
            let unavailable = || ApiError::Http {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "HTTP 503".to_string(),
            };
            Ok(match data_type {
                DataType::ProductUpdates => {
                    let n = self.product_fetches.fetch_add(1, Ordering::SeqCst);
                    if self.fail_products && n == 0 {
                        return Err(unavailable());
                    }
                    PollData::Products(vec![
                        product(1, "Dairy", Decimal::new(1000, 2)),
                        product(2, "Bakery", Decimal::new(550, 2)),
                    ])
                }
                DataType::CategoryUpdates if self.fail_categories => return Err(unavailable()),
                DataType::CategoryUpdates => PollData::Categories(vec![Category {
                    id: CategoryId::new(1),
                    name: "Dairy".to_string(),
                    description: None,
                }]),
                DataType::Notifications => {
                    PollData::Notifications(vec![notification(1, false), notification(2, true)])
                }
                DataType::Advertisements => return Err(unavailable()),
                DataType::Promotions => PollData::Promotions(Vec::new()),
                DataType::Deals => PollData::Deals(Vec::new()),
                DataType::Orders => PollData::Orders(Vec::new()),
                DataType::Cart => PollData::Cart(RemoteCart::default()),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_loads_and_polls_catalog() {
        let manager = PollingManager::new(FakeStore::default(), PollingConfig::default());
        let dashboard = Dashboard::new();
        dashboard.mount(&manager).await.unwrap();

        let state = dashboard.snapshot();
        assert_eq!(state.products.len(), 2);
        assert_eq!(state.category_options(), vec!["all", "Dairy"]);
        assert!(state.advertisements.is_empty());
        assert!(state.error.is_none());
        assert_eq!(manager.active(), POLLED_TYPES.to_vec());

        dashboard.unmount();
        dashboard.unmount();
        assert!(manager.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_initial_loads_show_banner_until_recovered() {
        let manager = PollingManager::new(
            FakeStore {
                fail_products: true,
                ..FakeStore::default()
            },
            PollingConfig::default(),
        );
        let dashboard = Dashboard::new();
        dashboard.mount(&manager).await.unwrap();
        assert_eq!(dashboard.error().as_deref(), Some(PRODUCTS_LOAD_ERROR));
        assert!(dashboard.snapshot().products.is_empty());

        // The first polling cycle runs as soon as the task is scheduled.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let state = dashboard.snapshot();
        assert_eq!(state.products.len(), 2);
        assert!(state.error.is_none());
        dashboard.unmount();
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_failure_banner() {
        let manager = PollingManager::new(
            FakeStore {
                fail_categories: true,
                ..FakeStore::default()
            },
            PollingConfig::default(),
        );
        let dashboard = Dashboard::new();
        dashboard.mount(&manager).await.unwrap();
        assert_eq!(dashboard.error().as_deref(), Some(CATEGORIES_LOAD_ERROR));
        assert_eq!(dashboard.snapshot().category_options(), vec!["all"]);
        dashboard.clear_error();
        assert!(dashboard.error().is_none());
    }

    #[test]
    fn test_cart_through_dashboard() {
        let dashboard = Dashboard::new();
        dashboard.apply(PollData::Products(vec![
            product(1, "Dairy", Decimal::new(1000, 2)),
            product(2, "Bakery", Decimal::new(550, 2)),
        ]));

        assert!(dashboard.add_to_cart(ProductId::new(1)));
        assert!(dashboard.add_to_cart(ProductId::new(2)));
        assert!(dashboard.add_to_cart(ProductId::new(2)));
        assert!(!dashboard.add_to_cart(ProductId::new(99)));

        let totals = dashboard.cart_totals();
        assert_eq!(totals.subtotal, Decimal::new(2100, 2));
        assert_eq!(totals.shipping, Decimal::new(999, 2));

        dashboard.update_quantity(ProductId::new(2), 0);
        dashboard.remove_from_cart(ProductId::new(1));
        assert!(dashboard.with_state(|s| s.cart.is_empty()));
    }

    #[test]
    fn test_polled_products_do_not_change_cart_lines() {
        let dashboard = Dashboard::new();
        dashboard.apply(PollData::Products(vec![product(1, "Dairy", Decimal::ONE)]));
        dashboard.add_to_cart(ProductId::new(1));
        dashboard.apply(PollData::Products(vec![product(1, "Dairy", Decimal::TEN)]));
        assert_eq!(dashboard.cart_totals().subtotal, Decimal::ONE);
    }

    #[test]
    fn test_category_filter() {
        let dashboard = Dashboard::new();
        dashboard.apply(PollData::Products(vec![
            product(1, "Dairy", Decimal::ONE),
            product(2, "Bakery", Decimal::ONE),
        ]));
        dashboard.select_category("Bakery");
        let visible: Vec<_> =
            dashboard.with_state(|s| s.visible_products().iter().map(|p| p.id).collect());
        assert_eq!(visible, vec![ProductId::new(2)]);

        dashboard.select_category(ALL_CATEGORIES);
        assert_eq!(dashboard.with_state(|s| s.visible_products().len()), 2);
    }

    #[test]
    fn test_mark_read() {
        let dashboard = Dashboard::new();
        dashboard.apply(PollData::Notifications(vec![
            notification(1, false),
            notification(2, false),
            notification(3, true),
        ]));
        assert_eq!(dashboard.unread_count(), 2);

        dashboard.mark_read(NotificationId::new(1));
        dashboard.mark_read(NotificationId::new(42));
        assert_eq!(dashboard.unread_count(), 1);

        dashboard.mark_all_read();
        assert_eq!(dashboard.unread_count(), 0);
    }
}
