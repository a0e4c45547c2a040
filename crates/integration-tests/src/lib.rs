//! Integration tests for Temple POS.
//!
//! Requests run in-process against the full storefront router, with the
//! session layer backed by `MemoryStore` and a fixed catalog, so no database
//! or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p temple-pos-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use temple_pos_core::{CurrencyCode, Price, ProductId};
use temple_pos_storefront::{
    catalog::{CatalogProduct, ProductKind, StaticCatalog},
    config::StorefrontConfig,
    middleware::{SESSION_COOKIE_NAME, create_session_layer},
    state::AppState,
};

/// Lamp lighting event: $10.00, 3 seats.
pub const LAMP_LIGHTING: i32 = 1;
/// Monthly archana plan: $25.50, 100 slots.
pub const ARCHANA_PLAN: i32 = 2;
/// Havan event with no seats left.
pub const SOLD_OUT_HAVAN: i32 = 3;
/// Plan priced in euros.
pub const EURO_PLAN: i32 = 4;
/// Not in the catalog.
pub const UNKNOWN: i32 = 99;

fn product(
    id: i32,
    kind: ProductKind,
    title: &str,
    cents: i64,
    currency: CurrencyCode,
    stock: u32,
) -> CatalogProduct {
    CatalogProduct {
        id: ProductId::new(id),
        kind,
        title: title.to_string(),
        description: None,
        price: Price::new(Decimal::new(cents, 2), currency).unwrap(),
        stock,
        image_url: None,
        starts_at: None,
    }
}

/// The catalog every test runs against.
#[must_use]
pub fn test_catalog() -> StaticCatalog {
    let mut lamp = product(
        LAMP_LIGHTING,
        ProductKind::Event,
        "Diwali Lamp Lighting",
        1000,
        CurrencyCode::USD,
        3,
    );
    lamp.starts_at = Some(Utc.with_ymd_and_hms(2026, 11, 8, 18, 0, 0).unwrap());

    StaticCatalog::new(vec![
        lamp,
        product(
            ARCHANA_PLAN,
            ProductKind::Plan,
            "Monthly Archana",
            2550,
            CurrencyCode::USD,
            100,
        ),
        product(
            SOLD_OUT_HAVAN,
            ProductKind::Event,
            "Navagraha Havan",
            1500,
            CurrencyCode::USD,
            0,
        ),
        product(
            EURO_PLAN,
            ProductKind::Plan,
            "Annadanam Sponsorship",
            4000,
            CurrencyCode::EUR,
            10,
        ),
    ])
}

/// Configuration for tests; never connects anywhere.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig::from_lookup(|key| match key {
        "STOREFRONT_DATABASE_URL" => Some("postgres://localhost/temple_pos_test".to_string()),
        "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
        _ => None,
    })
    .unwrap()
}

/// A response with its body read into a string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `HX-Trigger` header, if any.
    #[must_use]
    pub fn hx_trigger(&self) -> Option<&str> {
        self.headers
            .get("hx-trigger")
            .and_then(|v| v.to_str().ok())
    }

    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// One visitor: the router plus the visitor's session cookie.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// A fresh visitor against the standard test catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_app(test_app(MemoryStore::default()))
    }

    /// A fresh visitor against an existing router.
    #[must_use]
    pub const fn with_app(app: Router) -> Self {
        Self { app, cookie: None }
    }

    /// Present `cookie` (`name=value`) on subsequent requests.
    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// The current session cookie (`name=value`).
    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Send a GET request.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::get(uri), Body::empty()).await
    }

    /// Send an HTMX form POST.
    pub async fn htmx_post(&mut self, uri: &str, form: &str) -> TestResponse {
        let builder = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("hx-request", "true");
        self.send(builder, Body::from(form.to_string())).await
    }

    /// Send a plain (non-HTMX) form POST.
    pub async fn form_post(&mut self, uri: &str, form: &str) -> TestResponse {
        let builder =
            Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(builder, Body::from(form.to_string())).await
    }

    /// Fetch `/cart/summary` as JSON.
    pub async fn summary(&mut self) -> serde_json::Value {
        let response = self.get("/cart/summary").await;
        assert_eq!(response.status, StatusCode::OK);
        response.json()
    }

    async fn send(&mut self, mut builder: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        if let Some(cookie) = session_cookie(response.headers()) {
            self.cookie = Some(cookie);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the storefront router over `store` and the test catalog.
///
/// Clones of a `MemoryStore` share their sessions.
#[must_use]
pub fn test_app(store: MemoryStore) -> Router {
    let config = test_config();
    let session_layer = create_session_layer(store, &config);
    let state = AppState::new(config, Arc::new(test_catalog()));
    temple_pos_storefront::app(state, session_layer)
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
        .map(str::to_string)
}
