//! Category filtering and the dashboard's free-text search.

use crate::types::{Category, Deal, Order, Product};

/// Selector value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// Options for the category selector: `"all"` followed by category names.
#[must_use]
pub fn category_options(categories: &[Category]) -> Vec<String> {
    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(categories.iter().map(|c| c.name.clone()))
        .collect()
}

/// Products in the selected category, or all products for `"all"`.
#[must_use]
pub fn filter_by_category<'a>(products: &'a [Product], selected: &str) -> Vec<&'a Product> {
    if selected == ALL_CATEGORIES {
        return products.iter().collect();
    }
    products.iter().filter(|p| p.category == selected).collect()
}

/// Matches for a search query across products, orders and deals.
#[derive(Debug, Default, PartialEq)]
pub struct SearchResults<'a> {
    pub products: Vec<&'a Product>,
    pub orders: Vec<&'a Order>,
    pub deals: Vec<&'a Deal>,
}

impl SearchResults<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.orders.is_empty() && self.deals.is_empty()
    }
}

/// Case-insensitive substring search.
///
/// A blank query matches nothing. Products match on name, category or
/// description; orders on reference, status or payment method; deals on
/// name or category.
#[must_use]
pub fn search<'a>(
    query: &str,
    products: &'a [Product],
    orders: &'a [Order],
    deals: &'a [Deal],
) -> SearchResults<'a> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return SearchResults::default();
    }
    let hit = |haystack: &str| haystack.to_lowercase().contains(&needle);

    SearchResults {
        products: products
            .iter()
            .filter(|p| hit(&p.name) || hit(&p.category) || hit(&p.description))
            .collect(),
        orders: orders
            .iter()
            .filter(|o| {
                hit(&o.reference())
                    || hit(o.status.label())
                    || hit(o.payment_method.as_str())
                    || hit(o.payment_method.label())
            })
            .collect(),
        deals: deals
            .iter()
            .filter(|d| hit(&d.name) || hit(&d.category))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::{CategoryId, DealId, OrderId, OrderStatus, PaymentMethod, ProductId};

    fn product(id: i64, name: &str, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Decimal::ONE,
            image: String::new(),
            category: category.to_string(),
            subcategory: String::new(),
            rating: 4.0,
            description: format!("Fresh {name}"),
            stock: 1,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Whole Milk", "Dairy"),
            product(2, "Cheddar", "Dairy"),
            product(3, "Sourdough", "Bakery"),
        ]
    }

    #[test]
    fn test_category_options_start_with_all() {
        let categories = vec![
            Category {
                id: CategoryId::new(1),
                name: "Dairy".to_string(),
                description: None,
            },
            Category {
                id: CategoryId::new(2),
                name: "Bakery".to_string(),
                description: None,
            },
        ];
        assert_eq!(category_options(&categories), ["all", "Dairy", "Bakery"]);
        assert_eq!(category_options(&[]), ["all"]);
    }

    #[test]
    fn test_filter_by_category() {
        let products = catalog();
        assert_eq!(filter_by_category(&products, "all").len(), 3);
        let dairy = filter_by_category(&products, "Dairy");
        assert_eq!(dairy.len(), 2);
        assert!(dairy.iter().all(|p| p.category == "Dairy"));
        assert!(filter_by_category(&products, "Produce").is_empty());
    }

    #[test]
    fn test_blank_search_matches_nothing() {
        let products = catalog();
        assert!(search("   ", &products, &[], &[]).is_empty());
    }

    #[test]
    fn test_search_across_collections() {
        let products = catalog();
        let orders = vec![Order {
            id: OrderId::new(4),
            order_number: Some("ORD-004".to_string()),
            date: None,
            total: Decimal::new(4550, 2),
            status: OrderStatus::Delivered,
            item_count: 2,
            payment_method: PaymentMethod::MPesa,
            tracking: Some("Completed".to_string()),
        }];
        let deals = vec![Deal {
            id: DealId::new(1),
            name: "Dairy Week".to_string(),
            discount: 20,
            category: "Dairy".to_string(),
            expires: None,
            image: None,
        }];

        let results = search("DAIRY", &products, &orders, &deals);
        assert_eq!(results.products.len(), 2);
        assert_eq!(results.deals.len(), 1);
        assert!(results.orders.is_empty());

        let results = search("m-pesa", &products, &orders, &deals);
        assert_eq!(results.orders.len(), 1);

        let results = search("ord-004", &products, &orders, &deals);
        assert_eq!(results.orders.len(), 1);

        let results = search("sourdough", &products, &orders, &deals);
        assert_eq!(results.products.len(), 1);
    }
}
