//! Integration tests for catalog reads falling back to cashier endpoints.

#![allow(clippy::unwrap_used)]

use linemart_core::CategoryId;
use linemart_core::types::product::DEFAULT_PRODUCT_IMAGE;
use linemart_integration_tests::http::{Method, StatusCode};
use linemart_integration_tests::{MockBackend, product_json};
use linemart_storefront::api::ProductQuery;
use serde_json::json;

const CUSTOMER_PRODUCTS: &str = "/api/customer/products/";
const CASHIER_PRODUCTS: &str = "/api/cashier/products/";

#[tokio::test]
async fn test_customer_endpoint_used_when_it_works() {
    let backend = MockBackend::start().await;
    backend.respond_json(
        Method::GET,
        CUSTOMER_PRODUCTS,
        StatusCode::OK,
        json!([product_json(1, "Oat Milk", "3.49", "Dairy")]),
    );

    let products = backend
        .shell()
        .catalog()
        .products(&ProductQuery::all())
        .await
        .unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Oat Milk");
    assert!(backend.requests_to(CASHIER_PRODUCTS).is_empty());
}

#[tokio::test]
async fn test_cashier_tried_once_after_customer_failure() {
    let backend = MockBackend::start().await;
    backend.respond_json(
        Method::GET,
        CUSTOMER_PRODUCTS,
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "customer catalog offline" }),
    );
    backend.respond_json(
        Method::GET,
        CASHIER_PRODUCTS,
        StatusCode::OK,
        json!({
            "count": 1,
            "results": [{ "id": 8, "name": "Bread", "price": "2.50", "category": "Bakery", "image": "" }]
        }),
    );

    let products = backend
        .shell()
        .catalog()
        .products(&ProductQuery::all())
        .await
        .unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].category, "Bakery");
    assert_eq!(products[0].image, DEFAULT_PRODUCT_IMAGE);
    assert_eq!(backend.requests_to(CUSTOMER_PRODUCTS).len(), 1);
    assert_eq!(backend.requests_to(CASHIER_PRODUCTS).len(), 1);
}

#[tokio::test]
async fn test_fallback_keeps_filters() {
    let backend = MockBackend::start().await;
    backend.respond_json(Method::GET, CASHIER_PRODUCTS, StatusCode::OK, json!([]));

    let query = ProductQuery::search("milk").in_category(CategoryId::new(3));
    let products = backend.shell().catalog().products(&query).await.unwrap();
    assert!(products.is_empty());

    let customer = &backend.requests_to(CUSTOMER_PRODUCTS)[0];
    let cashier = &backend.requests_to(CASHIER_PRODUCTS)[0];
    for request in [customer, cashier] {
        assert_eq!(request.query_param("search").as_deref(), Some("milk"));
        assert_eq!(request.query_param("category").as_deref(), Some("3"));
    }
}

#[tokio::test]
async fn test_second_failure_is_returned() {
    let backend = MockBackend::start().await;
    backend.respond_json(
        Method::GET,
        "/api/cashier/categories/",
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": "Cashier service down" }),
    );

    let err = backend.shell().catalog().categories().await.unwrap_err();

    assert_eq!(err.user_message(), "Cashier service down");
    assert_eq!(backend.requests_to("/api/customer/categories/").len(), 1);
    assert_eq!(backend.requests_to("/api/cashier/categories/").len(), 1);
}

#[tokio::test]
async fn test_advertisements_fall_back() {
    let backend = MockBackend::start().await;
    backend.respond_json(
        Method::GET,
        "/api/cashier/advertisements/",
        StatusCode::OK,
        json!([{ "id": 2, "title": "Weekend sale" }]),
    );

    let ads = backend.shell().catalog().advertisements().await.unwrap();
    assert_eq!(ads.len(), 1);
    assert_eq!(ads[0].title, "Weekend sale");
    assert!(ads[0].is_active);
}

#[tokio::test]
async fn test_other_endpoints_do_not_fall_back() {
    let backend = MockBackend::start().await;

    let err = backend.shell().customer().deals().await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert!(backend.requests_to("/api/cashier/deals/").is_empty());
}
