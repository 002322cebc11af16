//! Catalog types as the storefront displays them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, SubcategoryId};

/// Image shown when the backend has none for a product.
pub const DEFAULT_PRODUCT_IMAGE: &str = "/download.jpg";

/// Category label for products the backend has not categorized.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Rating shown for every product until the backend serves real ratings.
pub const DEFAULT_RATING: f64 = 4.0;

/// A product as shown in the storefront.
///
/// Always reflects the last successful fetch; the cart copies it rather
/// than referencing it, so a later refresh never changes a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
    pub subcategory: String,
    pub rating: f64,
    pub description: String,
    pub stock: i64,
}

impl Product {
    /// Whether at least one unit is in stock.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A subcategory nested under a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub name: String,
    #[serde(default)]
    pub category: Option<CategoryId>,
}
