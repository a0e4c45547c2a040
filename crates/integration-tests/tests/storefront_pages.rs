//! Integration tests for catalog pages and health checks.
//!
//! Run with: cargo test -p temple-pos-integration-tests

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};

use temple_pos_integration_tests::TestClient;

#[tokio::test]
async fn test_health_checks() {
    let mut client = TestClient::new();

    let response = client.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");

    let response = client.get("/health/ready").await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let mut client = TestClient::new();

    let response = client.get("/").await;
    assert!(response.status.is_redirection());
    assert_eq!(response.headers[header::LOCATION], "/catalog");
}

#[tokio::test]
async fn test_catalog_lists_everything() {
    let mut client = TestClient::new();

    let response = client.get("/catalog").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Diwali Lamp Lighting"));
    assert!(response.body.contains("Monthly Archana"));
    assert!(response.body.contains("$25.50"));
    assert!(response.body.contains("Sun 08 Nov 2026, 18:00 UTC"));
}

#[tokio::test]
async fn test_catalog_filters_by_kind() {
    let mut client = TestClient::new();

    let events = client.get("/catalog/events").await;
    assert_eq!(events.status, StatusCode::OK);
    assert!(events.body.contains("Diwali Lamp Lighting"));
    assert!(!events.body.contains("Monthly Archana"));

    let plans = client.get("/catalog/plans").await;
    assert!(plans.body.contains("Monthly Archana"));
    assert!(!plans.body.contains("Diwali Lamp Lighting"));
}

#[tokio::test]
async fn test_sold_out_product_has_no_add_form() {
    let mut client = TestClient::new();

    let response = client.get("/catalog/events").await;
    assert!(response.body.contains("Navagraha Havan"));
    assert!(response.body.contains("Sold out"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let mut client = TestClient::new();

    let response = client.get("/catalog").await;
    assert_eq!(response.headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(response.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(response.headers.contains_key(header::CONTENT_SECURITY_POLICY));
}

#[tokio::test]
async fn test_cart_count_badge() {
    let mut client = TestClient::new();

    let response = client.get("/cart/count").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body.contains("cart-count"));

    client.htmx_post("/cart/add", "product_id=2&quantity=4").await;

    let response = client.get("/cart/count").await;
    assert!(response.body.contains(r#"<span class="cart-count">4</span>"#));
}
