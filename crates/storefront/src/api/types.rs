//! Wire-level request and response shapes for the REST backend.
//!
//! Response records accept the loose shapes the backend produces (optional
//! fields, paged or bare lists) and are converted into `linemart_core` types
//! in `conversions`. Records the storefront only displays are decoded
//! directly into their public type here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use linemart_core::{
    CategoryId, CheckoutTotals, DeliveryId, OrderId, PaymentId, PaymentMethod, ProductId,
    ReviewId, ShippingInfo, StoreId, UserId, UserRole,
};

/// A list endpoint response: either a bare JSON array or a paged envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListResponse<T> {
    /// The records, whatever the envelope.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(items) | Self::Paged { results: items } => items,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product as served by the customer or cashier product endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    /// Category label on the cashier endpoint; an id on some deployments.
    #[serde(default)]
    pub category: Option<serde_json::Value>,
    #[serde(default)]
    pub subcategory_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// A category record.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// An order as served by `/customer/orders/`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    /// Either a count or the list of order lines.
    #[serde(default)]
    pub items: Option<serde_json::Value>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub tracking: Option<String>,
    #[serde(default)]
    pub tracking_info: Option<String>,
}

/// One line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
}

/// Body of `POST /customer/orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl NewOrder {
    /// Build an order body from cart lines, shipping form and totals.
    #[must_use]
    pub fn new(
        cart: &linemart_core::Cart,
        shipping_address: ShippingInfo,
        payment_method: PaymentMethod,
    ) -> Self {
        let totals = CheckoutTotals::for_cart(cart);
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| NewOrderItem {
                    product_id: line.product.id,
                    quantity: line.quantity,
                    price: line.product.price,
                })
                .collect(),
            shipping_address,
            payment_method,
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            tax: totals.tax,
            total: totals.grand_total,
        }
    }
}

// =============================================================================
// Account, reviews, stores, payments, deliveries
// =============================================================================

/// Response of the customer login and register endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

const fn default_role() -> UserRole {
    UserRole::Customer
}

/// Customer profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub product: Option<ProductId>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Fields for creating or editing a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewInput {
    pub product: ProductId,
    pub rating: u8,
    pub comment: String,
}

/// Loyalty points balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LoyaltyPoints {
    #[serde(default)]
    pub points: i64,
}

/// A physical store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A payment against an order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    #[serde(default)]
    pub order: Option<OrderId>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// Fields for recording a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInput {
    pub order: OrderId,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

/// A delivery for an order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    #[serde(default)]
    pub order: Option<OrderId>,
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
}

/// One entry of a delivery's tracking history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingEvent {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}
