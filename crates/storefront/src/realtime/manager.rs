//! Registry of polling subscriptions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::PollingConfig;

use super::{DataSource, DataType, PollData, PollingError};

type Callback = Arc<dyn Fn(PollData) + Send + Sync>;

struct Subscription {
    generation: u64,
    interval: Duration,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    subscriptions: HashMap<DataType, Subscription>,
}

impl Registry {
    fn cancel(&mut self, data_type: DataType) -> bool {
        self.subscriptions
            .remove(&data_type)
            .map(|subscription| subscription.task.abort())
            .is_some()
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns every polling subscription.
///
/// Each subscription is a Tokio task that fetches immediately and then once
/// per interval, passing successful results to its callback. A failed fetch
/// is logged and skipped; the callback only ever sees good data.
///
/// Dropping the manager stops every subscription.
pub struct PollingManager<S: DataSource> {
    source: Arc<S>,
    intervals: PollingConfig,
    registry: Arc<Mutex<Registry>>,
}

impl<S: DataSource> PollingManager<S> {
    #[must_use]
    pub fn new(source: S, intervals: PollingConfig) -> Self {
        Self {
            source: Arc::new(source),
            intervals,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// The data source subscriptions fetch from.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Configured interval for a data type.
    #[must_use]
    pub const fn interval_for(&self, data_type: DataType) -> Duration {
        self.intervals.interval_for(data_type)
    }

    /// Start polling `data_type`, replacing any existing subscription for it.
    ///
    /// The first fetch runs as soon as the task is scheduled; later fetches
    /// follow every `interval`. A fetch that overruns its interval delays
    /// the next one rather than causing a burst.
    ///
    /// # Errors
    ///
    /// - [`PollingError::ZeroInterval`] if `interval` is zero
    /// - [`PollingError::NoRuntime`] outside a Tokio runtime
    pub fn start<F>(
        &self,
        data_type: DataType,
        callback: F,
        interval: Duration,
    ) -> Result<PollingHandle, PollingError>
    where
        F: Fn(PollData) + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(PollingError::ZeroInterval);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PollingError::NoRuntime)?;

        let mut registry = lock(&self.registry);
        if registry.cancel(data_type) {
            debug!(data_type = %data_type, "Replacing existing subscription");
        }

        let generation = registry.next_generation;
        registry.next_generation += 1;

        let task = runtime.spawn(poll_loop(
            Arc::clone(&self.source),
            data_type,
            Arc::new(callback),
            interval,
        ));
        registry.subscriptions.insert(
            data_type,
            Subscription {
                generation,
                interval,
                task,
            },
        );
        info!(data_type = %data_type, interval_secs = interval.as_secs_f64(), "Polling started");

        Ok(PollingHandle {
            data_type,
            generation,
            registry: Arc::downgrade(&self.registry),
        })
    }

    /// Start polling `data_type` at its configured interval.
    ///
    /// # Errors
    ///
    /// As [`PollingManager::start`].
    pub fn start_default<F>(
        &self,
        data_type: DataType,
        callback: F,
    ) -> Result<PollingHandle, PollingError>
    where
        F: Fn(PollData) + Send + Sync + 'static,
    {
        self.start(data_type, callback, self.interval_for(data_type))
    }

    /// Stop polling `data_type`. Does nothing if it is not being polled.
    pub fn stop(&self, data_type: DataType) {
        if lock(&self.registry).cancel(data_type) {
            info!(data_type = %data_type, "Polling stopped");
        }
    }

    /// Stop every subscription. Safe to call repeatedly.
    pub fn stop_all(&self) {
        let mut registry = lock(&self.registry);
        let count = registry.subscriptions.len();
        for (_, subscription) in registry.subscriptions.drain() {
            subscription.task.abort();
        }
        if count > 0 {
            info!(count, "All polling stopped");
        }
    }

    /// Data types currently being polled, sorted.
    #[must_use]
    pub fn active(&self) -> Vec<DataType> {
        let mut active: Vec<_> = lock(&self.registry).subscriptions.keys().copied().collect();
        active.sort_unstable();
        active
    }

    /// Whether `data_type` is being polled.
    #[must_use]
    pub fn is_active(&self, data_type: DataType) -> bool {
        lock(&self.registry).subscriptions.contains_key(&data_type)
    }

    /// Interval of the active subscription for `data_type`.
    #[must_use]
    pub fn active_interval(&self, data_type: DataType) -> Option<Duration> {
        lock(&self.registry)
            .subscriptions
            .get(&data_type)
            .map(|subscription| subscription.interval)
    }
}

impl<S: DataSource> Drop for PollingManager<S> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn poll_loop<S: DataSource>(
    source: Arc<S>,
    data_type: DataType,
    callback: Callback,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match source.fetch(data_type).await {
            Ok(data) if data.data_type() == data_type => callback(data),
            Ok(data) => warn!(
                data_type = %data_type,
                received = %data.data_type(),
                "Data source answered with the wrong data type"
            ),
            Err(e) => error!(data_type = %data_type, error = %e, "Polling fetch failed"),
        }
    }
}

/// Cancels one subscription.
///
/// A handle only cancels the subscription it was returned for. Once that
/// subscription has been replaced or stopped, cancelling is a no-op.
#[derive(Debug, Clone)]
pub struct PollingHandle {
    data_type: DataType,
    generation: u64,
    registry: Weak<Mutex<Registry>>,
}

impl PollingHandle {
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Whether this handle's subscription is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            lock(&registry)
                .subscriptions
                .get(&self.data_type)
                .is_some_and(|s| s.generation == self.generation)
        })
    }

    /// Stop this subscription if it is still the current one for its type.
    pub fn cancel(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = lock(&registry);
        let is_current = registry
            .subscriptions
            .get(&self.data_type)
            .is_some_and(|s| s.generation == self.generation);
        if is_current {
            registry.cancel(self.data_type);
            info!(data_type = %self.data_type, "Polling cancelled");
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("next_generation", &self.next_generation)
            .field("active", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use linemart_core::{Category, CategoryId, RemoteCart};
    use reqwest::StatusCode;

    use super::*;
    use crate::api::ApiError;

    /// Counts fetches; fails the first `failures` of them.
    #[derive(Default)]
    struct FakeSource {
        fetches: AtomicUsize,
        failures: usize,
    }

    impl FakeSource {
        fn failing_first(failures: usize) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                failures,
            }
        }
    }

    impl DataSource for FakeSource {
        async fn fetch(&self, data_type: DataType) -> Result<PollData, ApiError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(ApiError::Http {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: "HTTP 503".to_string(),
                });
            }
            Ok(match data_type {
                DataType::CategoryUpdates => PollData::Categories(vec![Category {
                    id: CategoryId::new(1),
                    name: format!("Fetch {n}"),
                    description: None,
                }]),
                DataType::ProductUpdates => PollData::Products(Vec::new()),
                DataType::Promotions => PollData::Promotions(Vec::new()),
                DataType::Deals => PollData::Deals(Vec::new()),
                DataType::Advertisements => PollData::Advertisements(Vec::new()),
                DataType::Notifications => PollData::Notifications(Vec::new()),
                DataType::Orders => PollData::Orders(Vec::new()),
                DataType::Cart => PollData::Cart(RemoteCart::default()),
            })
        }
    }

    /// Always answers with a product list, whatever was asked for.
    #[derive(Default)]
    struct ProductsOnlySource {
        fetches: AtomicUsize,
    }

    impl DataSource for ProductsOnlySource {
        async fn fetch(&self, _data_type: DataType) -> Result<PollData, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(PollData::Products(Vec::new()))
        }
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(PollData) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (count, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    const TEN_SECS: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_every_interval() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        let (count, callback) = counter();
        manager
            .start(DataType::ProductUpdates, callback, TEN_SECS)
            .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(24)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_keeps_one_subscription() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        let old = manager
            .start(DataType::ProductUpdates, first_cb, TEN_SECS)
            .unwrap();
        manager
            .start(DataType::ProductUpdates, second_cb, TEN_SECS)
            .unwrap();
        assert_eq!(manager.active(), vec![DataType::ProductUpdates]);
        assert!(!old.is_active());

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_handle_does_not_cancel_successor() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        let (_, first_cb) = counter();
        let (_, second_cb) = counter();

        let old = manager
            .start(DataType::Notifications, first_cb, TEN_SECS)
            .unwrap();
        let current = manager
            .start(DataType::Notifications, second_cb, TEN_SECS)
            .unwrap();

        old.cancel();
        assert!(manager.is_active(DataType::Notifications));

        current.cancel();
        current.cancel();
        assert!(manager.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_callbacks() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        let (count, callback) = counter();
        manager.start(DataType::Orders, callback, TEN_SECS).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        manager.stop(DataType::Orders);
        manager.stop(DataType::Orders);
        manager.stop(DataType::Cart);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!manager.is_active(DataType::Orders));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_is_idempotent() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        for data_type in [DataType::Deals, DataType::Promotions, DataType::Cart] {
            let (_, callback) = counter();
            manager.start(data_type, callback, TEN_SECS).unwrap();
        }
        assert_eq!(
            manager.active(),
            vec![DataType::Promotions, DataType::Deals, DataType::Cart]
        );

        manager.stop_all();
        assert!(manager.active().is_empty());
        manager.stop_all();
        assert!(manager.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_skips_callback_and_keeps_schedule() {
        let manager = PollingManager::new(FakeSource::failing_first(2), PollingConfig::default());
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        manager
            .start(
                DataType::CategoryUpdates,
                move |data| {
                    if let PollData::Categories(categories) = data {
                        sink.lock().unwrap().push(categories[0].name.clone());
                    }
                },
                TEN_SECS,
            )
            .unwrap();

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(manager.source().fetches.load(Ordering::SeqCst), 4);
        assert_eq!(*names.lock().unwrap(), vec!["Fetch 2", "Fetch 3"]);
        assert!(manager.is_active(DataType::CategoryUpdates));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_payload_is_dropped() {
        let manager = PollingManager::new(ProductsOnlySource::default(), PollingConfig::default());
        let (count, callback) = counter();
        manager.start(DataType::Orders, callback, TEN_SECS).unwrap();

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(manager.source().fetches.load(Ordering::SeqCst), 3);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(manager.is_active(DataType::Orders));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        let (count, callback) = counter();
        let handle = manager
            .start(DataType::ProductUpdates, callback, TEN_SECS)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        drop(manager);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!handle.is_active());
        handle.cancel();
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        let (_, callback) = counter();
        let err = manager
            .start(DataType::Deals, callback, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, PollingError::ZeroInterval));
        assert!(manager.active().is_empty());
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        let (_, callback) = counter();
        let err = manager
            .start(DataType::Deals, callback, TEN_SECS)
            .unwrap_err();
        assert!(matches!(err, PollingError::NoRuntime));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_default_uses_configured_interval() {
        let manager = PollingManager::new(FakeSource::default(), PollingConfig::default());
        let (_, callback) = counter();
        manager
            .start_default(DataType::Advertisements, callback)
            .unwrap();
        assert_eq!(
            manager.active_interval(DataType::Advertisements),
            Some(Duration::from_secs(60))
        );
    }
}
