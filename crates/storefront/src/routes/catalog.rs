//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::catalog::{CatalogProduct, ProductKind};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub kind: &'static str,
    pub title: String,
    pub description: Option<String>,
    pub price: String,
    pub stock: u32,
    pub sold_out: bool,
    pub image_url: Option<String>,
    pub starts_at: Option<String>,
}

impl From<&CatalogProduct> for ProductView {
    fn from(product: &CatalogProduct) -> Self {
        Self {
            id: product.id.as_i32(),
            kind: product.kind.as_str(),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            stock: product.stock,
            sold_out: product.is_sold_out(),
            image_url: product.image_url.clone(),
            starts_at: product
                .starts_at
                .map(|t| t.format("%a %d %b %Y, %H:%M UTC").to_string()),
        }
    }
}

/// Catalog listing template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogIndexTemplate {
    pub heading: &'static str,
    pub products: Vec<ProductView>,
}

async fn render(state: &AppState, kind: Option<ProductKind>) -> Result<CatalogIndexTemplate> {
    let products = state.catalog().list(kind).await?;
    Ok(CatalogIndexTemplate {
        heading: kind.map_or("Events & Plans", |k| k.label()),
        products: products.iter().map(ProductView::from).collect(),
    })
}

/// List every active event and plan.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    render(&state, None).await
}

/// List active events.
#[instrument(skip(state))]
pub async fn events(State(state): State<AppState>) -> Result<impl IntoResponse> {
    render(&state, Some(ProductKind::Event)).await
}

/// List active plans.
#[instrument(skip(state))]
pub async fn plans(State(state): State<AppState>) -> Result<impl IntoResponse> {
    render(&state, Some(ProductKind::Plan)).await
}
