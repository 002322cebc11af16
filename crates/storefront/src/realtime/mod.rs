//! Periodic refresh of storefront data.
//!
//! The storefront has no push channel; "realtime" data is kept fresh by
//! polling. [`PollingManager`] owns one subscription per [`DataType`], each a
//! background task that fetches through a [`DataSource`] on an interval and
//! hands the result to a callback.
//!
//! [`RealtimeApi`] is the production data source. It authenticates with
//! whichever customer, cashier or manager token is stored, and reads the
//! catalog through the cashier fallback.

mod manager;

pub use manager::{PollingHandle, PollingManager};

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use linemart_core::{
    Advertisement, Category, Deal, Notification, Order, Product, Promotion, RemoteCart,
};

use crate::api::{
    ApiClient, ApiError, CustomerApi, FallbackApi, ProductQuery, REALTIME_TOKEN_KEYS,
};
use crate::config::StorefrontConfig;
use crate::session::SessionStore;

/// Errors from the polling layer.
#[derive(Debug, Error)]
pub enum PollingError {
    #[error("unknown data type: {0}")]
    UnknownDataType(String),

    #[error("polling interval must be greater than zero")]
    ZeroInterval,

    #[error("polling requires a running Tokio runtime")]
    NoRuntime,
}

/// Kinds of data that can be polled. Each has at most one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    ProductUpdates,
    CategoryUpdates,
    Promotions,
    Deals,
    Advertisements,
    Notifications,
    Orders,
    Cart,
}

impl DataType {
    /// Every data type, in display order.
    pub const ALL: [Self; 8] = [
        Self::ProductUpdates,
        Self::CategoryUpdates,
        Self::Promotions,
        Self::Deals,
        Self::Advertisements,
        Self::Notifications,
        Self::Orders,
        Self::Cart,
    ];

    /// Subscription name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductUpdates => "product_updates",
            Self::CategoryUpdates => "category_updates",
            Self::Promotions => "promotions",
            Self::Deals => "deals",
            Self::Advertisements => "advertisements",
            Self::Notifications => "notifications",
            Self::Orders => "orders",
            Self::Cart => "cart",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = PollingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| PollingError::UnknownDataType(s.to_string()))
    }
}

/// The result of one polling fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum PollData {
    Products(Vec<Product>),
    Categories(Vec<Category>),
    Promotions(Vec<Promotion>),
    Deals(Vec<Deal>),
    Advertisements(Vec<Advertisement>),
    Notifications(Vec<Notification>),
    Orders(Vec<Order>),
    Cart(RemoteCart),
}

impl PollData {
    /// The data type this payload answers.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Products(_) => DataType::ProductUpdates,
            Self::Categories(_) => DataType::CategoryUpdates,
            Self::Promotions(_) => DataType::Promotions,
            Self::Deals(_) => DataType::Deals,
            Self::Advertisements(_) => DataType::Advertisements,
            Self::Notifications(_) => DataType::Notifications,
            Self::Orders(_) => DataType::Orders,
            Self::Cart(_) => DataType::Cart,
        }
    }
}

/// Something that can fetch the current value of a [`DataType`].
pub trait DataSource: Send + Sync + 'static {
    /// Fetch the latest data for `data_type`.
    fn fetch(
        &self,
        data_type: DataType,
    ) -> impl Future<Output = Result<PollData, ApiError>> + Send;
}

/// Production data source backed by the REST API.
#[derive(Clone)]
pub struct RealtimeApi {
    api: FallbackApi,
}

impl RealtimeApi {
    /// Build a data source whose client sends the first stored customer,
    /// cashier or manager token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Setup` if the HTTP client fails to build.
    pub fn new(
        config: &StorefrontConfig,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let client = ApiClient::with_token_keys(config, session, REALTIME_TOKEN_KEYS)?;
        Ok(Self {
            api: FallbackApi::new(CustomerApi::new(client)),
        })
    }

    /// The catalog API this source reads through.
    #[must_use]
    pub const fn api(&self) -> &FallbackApi {
        &self.api
    }
}

impl DataSource for RealtimeApi {
    async fn fetch(&self, data_type: DataType) -> Result<PollData, ApiError> {
        let customer = self.api.customer();
        Ok(match data_type {
            DataType::ProductUpdates => {
                PollData::Products(self.api.products(&ProductQuery::all()).await?)
            }
            DataType::CategoryUpdates => PollData::Categories(self.api.categories().await?),
            DataType::Advertisements => PollData::Advertisements(self.api.advertisements().await?),
            DataType::Promotions => PollData::Promotions(customer.promotions().await?),
            DataType::Deals => PollData::Deals(customer.deals().await?),
            DataType::Notifications => PollData::Notifications(customer.notifications().await?),
            DataType::Orders => PollData::Orders(customer.orders().await?),
            DataType::Cart => PollData::Cart(customer.cart().await?),
        })
    }
}
