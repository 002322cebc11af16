//! Orders and the server-side cart snapshot.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartItemId, OrderId, ProductId};
use super::status::{OrderStatus, PaymentMethod};

/// A customer order, mirrored from the backend for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing reference such as `ORD-005`, when the backend has one.
    pub order_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub item_count: u32,
    pub payment_method: PaymentMethod,
    /// Free-form tracking label (e.g. "In Transit").
    pub tracking: Option<String>,
}

impl Order {
    /// Reference shown to the customer: the order number, else the numeric id.
    #[must_use]
    pub fn reference(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// One line of the server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartItem {
    pub id: CartItemId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub price: Decimal,
}

/// The server-side cart, as returned by `GET /customer/cart/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    #[serde(default)]
    pub total: Decimal,
}
