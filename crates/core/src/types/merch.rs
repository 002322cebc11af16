//! Merchandising and messaging records: promotions, deals, ads, notifications.
//!
//! These are display-only, so every field the backend may omit defaults.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AdvertisementId, DealId, NotificationId, PromotionId};
use super::status::NotificationKind;

/// A store-wide promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

/// A time-limited deal on a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub name: String,
    /// Discount in percent.
    #[serde(default)]
    pub discount: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub expires: Option<NaiveDate>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A banner advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: AdvertisementId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// A message for the signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default, rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    /// Relative or absolute time label as supplied by the backend.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub read: bool,
}
