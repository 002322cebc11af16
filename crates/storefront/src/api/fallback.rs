//! Legacy cashier endpoints as a fallback for catalog reads.
//!
//! Some deployments do not serve the customer catalog endpoints yet. For
//! products, categories and advertisements the storefront tries the customer
//! endpoint first and, on any failure, retries exactly once against the
//! cashier endpoint. The second error is the one returned.
//!
//! Delete this module once every backend serves `/customer/` catalog reads.

use std::future::Future;

use tracing::{instrument, warn};

use linemart_core::{Advertisement, Category, Product};

use super::conversions::{convert_categories, convert_products};
use super::types::{CategoryRecord, ListResponse, ProductRecord};
use super::{ApiError, ApiRequest, CustomerApi, ProductQuery};

/// Catalog reads with a cashier-endpoint fallback.
#[derive(Clone)]
pub struct FallbackApi {
    customer: CustomerApi,
}

impl FallbackApi {
    #[must_use]
    pub const fn new(customer: CustomerApi) -> Self {
        Self { customer }
    }

    /// The customer API this wraps.
    #[must_use]
    pub const fn customer(&self) -> &CustomerApi {
        &self.customer
    }

    async fn cashier_list<T: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Vec<T>, ApiError> {
        let response: ListResponse<T> = self.customer.client().call_as(request).await?;
        Ok(response.into_vec())
    }

    /// Products from `/customer/products/`, else `/cashier/products/` with
    /// the same filters.
    ///
    /// # Errors
    ///
    /// Returns the cashier endpoint's error when both attempts fail.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        with_fallback("products", self.customer.products(query), || async move {
            let records: Vec<ProductRecord> = self
                .cashier_list(query.request("cashier/products/"))
                .await?;
            Ok::<_, ApiError>(convert_products(records))
        })
        .await
    }

    /// Categories from `/customer/categories/`, else `/cashier/categories/`.
    ///
    /// # Errors
    ///
    /// Returns the cashier endpoint's error when both attempts fail.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        with_fallback("categories", self.customer.categories(), || async move {
            let records: Vec<CategoryRecord> = self
                .cashier_list(ApiRequest::get("cashier/categories/"))
                .await?;
            Ok::<_, ApiError>(convert_categories(records))
        })
        .await
    }

    /// Advertisements from `/customer/advertisements/`, else
    /// `/cashier/advertisements/`.
    ///
    /// # Errors
    ///
    /// Returns the cashier endpoint's error when both attempts fail.
    #[instrument(skip(self))]
    pub async fn advertisements(&self) -> Result<Vec<Advertisement>, ApiError> {
        with_fallback("advertisements", self.customer.advertisements(), || {
            self.cashier_list(ApiRequest::get("cashier/advertisements/"))
        })
        .await
    }
}

/// Await `primary`; on failure log and await `fallback()` once.
async fn with_fallback<T, P, F, Fut>(resource: &str, primary: P, fallback: F) -> Result<T, ApiError>
where
    P: Future<Output = Result<T, ApiError>>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match primary.await {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(
                resource,
                error = %e,
                "Customer endpoint failed, falling back to cashier endpoint"
            );
            fallback().await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;

    use super::*;

    fn http_error(status: StatusCode) -> ApiError {
        ApiError::Http {
            status,
            message: format!("HTTP {}", status.as_u16()),
        }
    }

    #[tokio::test]
    async fn test_with_fallback_skips_fallback_on_success() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = with_fallback("products", async { Ok(1) }, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_with_fallback_tries_once_and_returns_second_error() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<u32, _> = with_fallback(
            "categories",
            async { Err(http_error(StatusCode::NOT_FOUND)) },
            || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(http_error(StatusCode::FORBIDDEN))
            },
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().status(), Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_with_fallback_recovers() {
        let result = with_fallback(
            "advertisements",
            async { Err(http_error(StatusCode::INTERNAL_SERVER_ERROR)) },
            || async { Ok(vec!["banner"]) },
        )
        .await;
        assert_eq!(result.unwrap(), vec!["banner"]);
    }
}
