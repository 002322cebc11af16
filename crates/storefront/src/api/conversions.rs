//! Conversions from backend records to `linemart_core` types.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use linemart_core::{
    Category, DEFAULT_PRODUCT_IMAGE, DEFAULT_RATING, Order, OrderStatus, PaymentMethod, Product,
    UNCATEGORIZED,
};

use super::types::{CategoryRecord, OrderRecord, ProductRecord};

/// First non-blank string among the candidates.
fn non_blank(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

/// Convert a product record, filling display defaults.
pub fn convert_product(record: ProductRecord) -> Product {
    // The cashier endpoint sends the label in `category`; a numeric id there
    // carries no label.
    let category_label = match record.category {
        Some(serde_json::Value::String(label)) => Some(label),
        _ => None,
    };

    Product {
        id: record.id,
        name: record.name,
        price: record.price,
        image: non_blank([record.image]).unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string()),
        category: non_blank([record.category_name, category_label])
            .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        subcategory: record.subcategory_name.unwrap_or_default(),
        rating: DEFAULT_RATING,
        description: record.description.unwrap_or_default(),
        stock: record.stock.unwrap_or(0),
    }
}

pub fn convert_products(records: Vec<ProductRecord>) -> Vec<Product> {
    records.into_iter().map(convert_product).collect()
}

pub fn convert_category(record: CategoryRecord) -> Category {
    Category {
        id: record.id,
        name: record.name,
        description: record.description.filter(|d| !d.trim().is_empty()),
    }
}

pub fn convert_categories(records: Vec<CategoryRecord>) -> Vec<Category> {
    records.into_iter().map(convert_category).collect()
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            raw.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

/// Number of items in an order: a count, or the sum of line quantities.
fn item_count(items: Option<&serde_json::Value>) -> u32 {
    match items {
        Some(serde_json::Value::Number(n)) => {
            n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0)
        }
        Some(serde_json::Value::Array(lines)) => lines
            .iter()
            .map(|line| {
                line.get("quantity")
                    .and_then(serde_json::Value::as_u64)
                    .and_then(|q| u32::try_from(q).ok())
                    .unwrap_or(1)
            })
            .fold(0_u32, u32::saturating_add),
        _ => 0,
    }
}

/// Convert an order record.
///
/// Unrecognized status or payment tags fall back to `Placed` / `Card` so one
/// odd record never hides the rest of the order history.
pub fn convert_order(record: OrderRecord) -> Order {
    let status = record
        .status
        .as_deref()
        .map_or(Ok(OrderStatus::default()), str::parse)
        .unwrap_or_else(|e| {
            debug!(order_id = %record.id, error = %e, "Unrecognized order status");
            OrderStatus::default()
        });
    let payment_method = record
        .payment_method
        .as_deref()
        .map_or(Ok(PaymentMethod::default()), str::parse)
        .unwrap_or_else(|e| {
            debug!(order_id = %record.id, error = %e, "Unrecognized payment method");
            PaymentMethod::default()
        });

    Order {
        id: record.id,
        order_number: non_blank([record.order_number]),
        date: record
            .order_date
            .as_deref()
            .or(record.date.as_deref())
            .or(record.created_at.as_deref())
            .and_then(parse_date),
        total: record
            .total
            .or(record.total_amount)
            .unwrap_or(Decimal::ZERO),
        status,
        item_count: item_count(record.items.as_ref()),
        payment_method,
        tracking: non_blank([record.tracking_info, record.tracking]),
    }
}

pub fn convert_orders(records: Vec<OrderRecord>) -> Vec<Order> {
    records.into_iter().map(convert_order).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use linemart_core::{OrderId, ProductId};

    use super::*;

    fn product_record(json: &str) -> ProductRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_convert_product_fills_defaults() {
        let product = convert_product(product_record(r#"{"id": 4, "name": "Bread", "price": "2.50"}"#));
        assert_eq!(product.id, ProductId::new(4));
        assert_eq!(product.price, Decimal::new(250, 2));
        assert_eq!(product.image, "/download.jpg");
        assert_eq!(product.category, "Uncategorized");
        assert_eq!(product.subcategory, "");
        assert!((product.rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(product.description, "");
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_convert_product_prefers_category_name() {
        let product = convert_product(product_record(
            r#"{"id": 1, "name": "Milk", "price": 3, "category_name": "Dairy",
                "category": "Legacy", "image": "/milk.png", "stock": 12}"#,
        ));
        assert_eq!(product.category, "Dairy");
        assert_eq!(product.image, "/milk.png");
        assert_eq!(product.stock, 12);
        assert_eq!(product.price, Decimal::from(3));
    }

    #[test]
    fn test_convert_product_accepts_cashier_category_label() {
        let product = convert_product(product_record(
            r#"{"id": 1, "name": "Milk", "price": "3.00", "category": "Dairy"}"#,
        ));
        assert_eq!(product.category, "Dairy");

        let numeric = convert_product(product_record(
            r#"{"id": 1, "name": "Milk", "price": "3.00", "category": 5, "image": ""}"#,
        ));
        assert_eq!(numeric.category, "Uncategorized");
        assert_eq!(numeric.image, "/download.jpg");
    }

    #[test]
    fn test_convert_order_lenient_fields() {
        let record: OrderRecord = serde_json::from_str(
            r#"{"id": 12, "order_number": "ORD-012", "created_at": "2024-03-05T10:15:00Z",
                "total_amount": "64.80", "status": "Out for Delivery",
                "items": [{"quantity": 2}, {"quantity": 1}], "payment_method": "mpesa"}"#,
        )
        .unwrap();
        let order = convert_order(record);
        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.reference(), "ORD-012");
        assert_eq!(order.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(order.total, Decimal::new(6480, 2));
        assert_eq!(order.status, OrderStatus::OutForDelivery);
        assert_eq!(order.item_count, 3);
        assert_eq!(order.payment_method, PaymentMethod::MPesa);
    }

    #[test]
    fn test_convert_order_from_order_serializer() {
        let record: OrderRecord = serde_json::from_str(
            r#"{"id": 5, "order_number": "ORD-005", "order_date": "2025-07-30T10:00:00Z",
                "total_amount": "18.40", "status": "Shipped", "payment_method": "mastercard",
                "tracking_info": "In Transit", "items": [{"quantity": 1}]}"#,
        )
        .unwrap();
        let order = convert_order(record);
        assert_eq!(order.date, NaiveDate::from_ymd_opt(2025, 7, 30));
        assert_eq!(order.tracking.as_deref(), Some("In Transit"));
        assert_eq!(order.payment_method, PaymentMethod::Card);
        assert_eq!(order.total, Decimal::new(1840, 2));
    }

    #[test]
    fn test_convert_order_unknown_tags_fall_back() {
        let record: OrderRecord = serde_json::from_str(
            r#"{"id": 3, "date": "2024-01-15", "total": "10.00", "status": "teleported",
                "items": 4, "payment_method": "barter"}"#,
        )
        .unwrap();
        let order = convert_order(record);
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.payment_method, PaymentMethod::Card);
        assert_eq!(order.item_count, 4);
        assert_eq!(order.reference(), "3");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15"), expected);
        assert_eq!(parse_date("2024-01-15T08:00:00+03:00"), expected);
        assert_eq!(parse_date("2024-01-15 08:00:00.123456"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }
}
