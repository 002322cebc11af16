//! Customer-scoped endpoints under `/customer/`.

use serde_json::json;
use tracing::instrument;

use linemart_core::{
    Advertisement, CartItemId, Category, CategoryId, Deal, DeliveryId, Notification,
    NotificationId, Order, OrderId, PaymentId, Product, ProductId, Promotion, RemoteCart, ReviewId,
    StoreId, Subcategory,
};

use super::conversions::{
    convert_categories, convert_category, convert_order, convert_orders, convert_product,
    convert_products,
};
use super::types::{
    CategoryRecord, CustomerProfile, Delivery, ListResponse, LoyaltyPoints, NewOrder,
    OrderRecord, Payment, PaymentInput, ProductRecord, Review, ReviewInput, Store, TrackingEvent,
};
use super::{ApiClient, ApiError, ApiRequest};

/// Filters for the product list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
}

impl ProductQuery {
    /// Every product.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Products matching a search term.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            category: None,
        }
    }

    /// Restrict to one category.
    #[must_use]
    pub const fn in_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Product list request under `path` with these filters applied.
    pub(crate) fn request(&self, path: &str) -> ApiRequest {
        ApiRequest::get(path)
            .query_opt("search", self.search.as_deref())
            .query_opt("category", self.category)
    }
}

/// Client for the customer API.
#[derive(Clone)]
pub struct CustomerApi {
    client: ApiClient,
}

impl CustomerApi {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Vec<T>, ApiError> {
        let response: ListResponse<T> = self.client.call_as(request).await?;
        Ok(response.into_vec())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let records: Vec<ProductRecord> =
            self.list(query.request("customer/products/")).await?;
        Ok(convert_products(records))
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let record: ProductRecord = self
            .client
            .call_as(ApiRequest::get(format!("customer/products/{id}/")))
            .await?;
        Ok(convert_product(record))
    }

    /// List categories.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let records: Vec<CategoryRecord> =
            self.list(ApiRequest::get("customer/categories/")).await?;
        Ok(convert_categories(records))
    }

    /// Fetch one category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn category(&self, id: CategoryId) -> Result<Category, ApiError> {
        let record: CategoryRecord = self
            .client
            .call_as(ApiRequest::get(format!("customer/categories/{id}/")))
            .await?;
        Ok(convert_category(record))
    }

    /// List subcategories, optionally for one category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn subcategories(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Subcategory>, ApiError> {
        self.list(ApiRequest::get("customer/subcategories/").query_opt("category", category))
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// The signed-in customer's orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        let records: Vec<OrderRecord> = self.list(ApiRequest::get("customer/orders/")).await?;
        Ok(convert_orders(records))
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn order(&self, id: OrderId) -> Result<Order, ApiError> {
        let record: OrderRecord = self
            .client
            .call_as(ApiRequest::get(format!("customer/orders/{id}/")))
            .await?;
        Ok(convert_order(record))
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the order.
    #[instrument(skip(self, order), fields(items = order.items.len(), total = %order.total))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let body = serde_json::to_value(order)?;
        let record: OrderRecord = self
            .client
            .call_as(ApiRequest::post("customer/orders/").json(body))
            .await?;
        Ok(convert_order(record))
    }

    /// Cancel an order. Returns the backend's acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend refuses the cancellation.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(ApiRequest::post(format!("customer/orders/{id}/cancel/")))
            .await
    }

    // =========================================================================
    // Server-side cart
    // =========================================================================

    /// The server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn cart(&self) -> Result<RemoteCart, ApiError> {
        self.client.call_as(ApiRequest::get("customer/cart/")).await
    }

    /// Add a product to the server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn add_to_cart(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(
                ApiRequest::post("customer/cart/add/")
                    .json(json!({ "product_id": product_id, "quantity": quantity })),
            )
            .await
    }

    /// Change the quantity of a server-side cart item.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn update_cart_item(
        &self,
        item: CartItemId,
        quantity: u32,
    ) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(
                ApiRequest::put(format!("customer/cart/items/{item}/"))
                    .json(json!({ "quantity": quantity })),
            )
            .await
    }

    /// Remove an item from the server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn remove_cart_item(&self, item: CartItemId) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(ApiRequest::delete(format!("customer/cart/items/{item}/")))
            .await
    }

    /// Empty the server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn clear_cart(&self) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(ApiRequest::post("customer/cart/clear/"))
            .await
    }

    // =========================================================================
    // Wishlist and reviews
    // =========================================================================

    /// Wishlist entries as the backend serves them.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn wishlist(&self) -> Result<Vec<serde_json::Value>, ApiError> {
        self.list(ApiRequest::get("customer/wishlist/")).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn add_to_wishlist(&self, product_id: ProductId) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(ApiRequest::post("customer/wishlist/add/").json(json!({ "product_id": product_id })))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn remove_from_wishlist(
        &self,
        product_id: ProductId,
    ) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(ApiRequest::delete(format!("customer/wishlist/remove/{product_id}/")))
            .await
    }

    /// Reviews for a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn product_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ApiError> {
        self.list(ApiRequest::get(format!("customer/products/{product_id}/reviews/")))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the review.
    pub async fn create_review(&self, review: &ReviewInput) -> Result<Review, ApiError> {
        let body = serde_json::to_value(review)?;
        self.client
            .call_as(
                ApiRequest::post(format!("customer/products/{}/reviews/", review.product))
                    .json(body),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn update_review(
        &self,
        id: ReviewId,
        review: &ReviewInput,
    ) -> Result<Review, ApiError> {
        let body = serde_json::to_value(review)?;
        self.client
            .call_as(ApiRequest::put(format!("customer/reviews/{id}/")).json(body))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn delete_review(&self, id: ReviewId) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(ApiRequest::delete(format!("customer/reviews/{id}/")))
            .await
    }

    // =========================================================================
    // Merchandising
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn promotions(&self) -> Result<Vec<Promotion>, ApiError> {
        self.list(ApiRequest::get("customer/promotions/")).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn deals(&self) -> Result<Vec<Deal>, ApiError> {
        self.list(ApiRequest::get("customer/deals/")).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn advertisements(&self) -> Result<Vec<Advertisement>, ApiError> {
        self.list(ApiRequest::get("customer/advertisements/")).await
    }

    // =========================================================================
    // Profile and loyalty
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn profile(&self) -> Result<CustomerProfile, ApiError> {
        self.client.call_as(ApiRequest::get("customer/profile/")).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn update_profile(
        &self,
        profile: &CustomerProfile,
    ) -> Result<CustomerProfile, ApiError> {
        let body = serde_json::to_value(profile)?;
        self.client
            .call_as(ApiRequest::put("customer/profile/").json(body))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn loyalty_points(&self) -> Result<LoyaltyPoints, ApiError> {
        self.client
            .call_as(ApiRequest::get("customer/loyalty/points/"))
            .await
    }

    /// Loyalty ledger entries as the backend serves them.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn loyalty_history(&self) -> Result<Vec<serde_json::Value>, ApiError> {
        self.list(ApiRequest::get("customer/loyalty/history/")).await
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.list(ApiRequest::get("customer/notifications/")).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(ApiRequest::post(format!("customer/notifications/{id}/read/")))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the change.
    pub async fn mark_all_notifications_read(&self) -> Result<serde_json::Value, ApiError> {
        self.client
            .call(ApiRequest::post("customer/notifications/read-all/"))
            .await
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Server-side search. Blank filter values are not sent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn search(
        &self,
        query: &str,
        filters: &[(&str, &str)],
    ) -> Result<serde_json::Value, ApiError> {
        let request = filters.iter().fold(
            ApiRequest::get("customer/search/").query_opt("q", Some(query)),
            |request, (key, value)| request.query_opt(*key, Some(*value)),
        );
        self.client.call(request).await
    }

    // =========================================================================
    // Stores, payments, deliveries
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn stores(&self) -> Result<Vec<Store>, ApiError> {
        self.list(ApiRequest::get("customer/stores/")).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn store(&self, id: StoreId) -> Result<Store, ApiError> {
        self.client
            .call_as(ApiRequest::get(format!("customer/stores/{id}/")))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn payments(&self) -> Result<Vec<Payment>, ApiError> {
        self.list(ApiRequest::get("customer/payments/")).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the payment.
    pub async fn create_payment(&self, payment: &PaymentInput) -> Result<Payment, ApiError> {
        let body = serde_json::to_value(payment)?;
        self.client
            .call_as(ApiRequest::post("customer/payments/").json(body))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn payment(&self, id: PaymentId) -> Result<Payment, ApiError> {
        self.client
            .call_as(ApiRequest::get(format!("customer/payments/{id}/")))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn deliveries(&self) -> Result<Vec<Delivery>, ApiError> {
        self.list(ApiRequest::get("customer/deliveries/")).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn delivery(&self, id: DeliveryId) -> Result<Delivery, ApiError> {
        self.client
            .call_as(ApiRequest::get(format!("customer/deliveries/{id}/")))
            .await
    }

    /// Look a delivery up by its tracking number.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if no delivery matches or the body does not decode.
    #[instrument(skip(self))]
    pub async fn track_delivery(&self, tracking_number: &str) -> Result<Delivery, ApiError> {
        self.client
            .call_as(
                ApiRequest::get("customer/deliveries/track_by_number/")
                    .query("tracking_number", tracking_number),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    pub async fn delivery_tracking_history(
        &self,
        id: DeliveryId,
    ) -> Result<Vec<TrackingEvent>, ApiError> {
        self.list(ApiRequest::get(format!(
            "customer/deliveries/{id}/tracking_history/"
        )))
        .await
    }
}
