//! Status enums for orders, payments, accounts and notifications.
//!
//! The backend is not consistent about spelling: the same order status can
//! arrive as `"Out for Delivery"`, `"out_for_delivery"` or
//! `"out-for-delivery"`. Parsing normalizes case and separators before
//! matching so every variant maps to one enum value.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string does not match any known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Lowercase and collapse spaces/hyphens to underscores.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Placed,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether the order can still be cancelled by the customer.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Placed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "placed" | "pending" | "processing" => Ok(Self::Placed),
            "out_for_delivery" | "shipped" | "in_transit" => Ok(Self::OutForDelivery),
            "delivered" | "completed" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseStatusError::new("order status", s)),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Placed => "placed",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
        .to_owned()
    }
}

/// Payment method tag on orders and checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentMethod {
    #[default]
    Card,
    Visa,
    PayPal,
    MPesa,
}

impl PaymentMethod {
    /// Tag sent to and received from the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Visa => "visa",
            Self::PayPal => "paypal",
            Self::MPesa => "mpesa",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "Credit/Debit Card",
            Self::Visa => "Visa",
            Self::PayPal => "PayPal",
            Self::MPesa => "M-Pesa",
        }
    }

    /// Whether this method needs card details at checkout.
    #[must_use]
    pub const fn requires_card_details(self) -> bool {
        matches!(self, Self::Card | Self::Visa)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).replace('_', "").as_str() {
            "card" | "credit" | "debit" | "creditcard" | "mastercard" => Ok(Self::Card),
            "visa" => Ok(Self::Visa),
            "paypal" => Ok(Self::PayPal),
            "mpesa" => Ok(Self::MPesa),
            _ => Err(ParseStatusError::new("payment method", s)),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_owned()
    }
}

/// Account role reported by the auth backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Cashier,
    Manager,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Cashier => write!(f, "cashier"),
            Self::Manager => write!(f, "manager"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "cashier" => Ok(Self::Cashier),
            "manager" => Ok(Self::Manager),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Severity of a customer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}
