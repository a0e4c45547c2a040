//! Catalog repository for events and plans.
//!
//! Uses runtime-checked `sqlx` queries with `FromRow` row types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use temple_pos_core::{CurrencyCode, Price, ProductId};

use super::RepositoryError;
use crate::catalog::{CatalogError, CatalogProduct, ProductCatalog, ProductKind};

const PRODUCT_COLUMNS: &str = "id, kind, title, description, price, currency, stock, image_url, starts_at";

/// Repository for catalog database operations.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

/// A product as written by the seeding tool.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub kind: ProductKind,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
}

impl CatalogRepository {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get an active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row holds invalid values.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<CatalogProduct>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1 AND active"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CatalogProduct::try_from).transpose()
    }

    /// List active products, events ordered by start time then plans by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any row holds invalid values.
    #[instrument(skip(self))]
    pub async fn list_active(
        &self,
        kind: Option<ProductKind>,
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product
            WHERE active AND ($1::text IS NULL OR kind = $1)
            ORDER BY kind, starts_at NULLS LAST, title
            "
        ))
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CatalogProduct::try_from).collect()
    }

    /// Insert a product or overwrite the existing row with the same ID.
    ///
    /// Upserted products are always active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn upsert(&self, product: &NewProduct) -> Result<(), RepositoryError> {
        let stock = i32::try_from(product.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!("stock too large: {}", product.stock))
        })?;

        sqlx::query(
            r"
            INSERT INTO storefront.product
                (id, kind, title, description, price, currency, stock, image_url, starts_at, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
            ON CONFLICT (id) DO UPDATE SET
                kind = EXCLUDED.kind,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                currency = EXCLUDED.currency,
                stock = EXCLUDED.stock,
                image_url = EXCLUDED.image_url,
                starts_at = EXCLUDED.starts_at,
                active = TRUE,
                updated_at = NOW()
            ",
        )
        .bind(product.id)
        .bind(product.kind.as_str())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.currency.code())
        .bind(stock)
        .bind(&product.image_url)
        .bind(product.starts_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deactivate every product whose ID is not in `keep`.
    ///
    /// Returns the number of products deactivated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, keep), fields(keep = keep.len()))]
    pub async fn deactivate_except(&self, keep: &[ProductId]) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = keep.iter().map(ProductId::as_i32).collect();
        let result = sqlx::query(
            r"
            UPDATE storefront.product
            SET active = FALSE, updated_at = NOW()
            WHERE active AND NOT (id = ANY($1))
            ",
        )
        .bind(&ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProductCatalog for CatalogRepository {
    async fn find(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.get_by_id(id).await?)
    }

    async fn list(&self, kind: Option<ProductKind>) -> Result<Vec<CatalogProduct>, CatalogError> {
        Ok(self.list_active(kind).await?)
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

/// Internal row type for product queries.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    kind: String,
    title: String,
    description: Option<String>,
    price: Decimal,
    currency: String,
    stock: i32,
    image_url: Option<String>,
    starts_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRow> for CatalogProduct {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |what: String| {
            RepositoryError::DataCorruption(format!("product {}: {what}", row.id))
        };

        let kind = row.kind.parse::<ProductKind>().map_err(corrupt)?;
        let currency = row
            .currency
            .parse::<CurrencyCode>()
            .map_err(|e| corrupt(e.to_string()))?;
        let price = Price::new(row.price, currency).map_err(|e| corrupt(e.to_string()))?;
        // Oversold rows read as sold out.
        let stock = u32::try_from(row.stock).unwrap_or(0);

        Ok(Self {
            id: ProductId::new(row.id),
            kind,
            title: row.title,
            description: row.description,
            price,
            stock,
            image_url: row.image_url,
            starts_at: row.starts_at,
        })
    }
}
