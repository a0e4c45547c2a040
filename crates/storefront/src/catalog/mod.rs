//! Product catalog: temple events and plans.
//!
//! The catalog is the upstream source of the product data a cart line is
//! built from. Each product's `stock` becomes the line's `max_quantity` at
//! the time it is added.
//!
//! Implementations:
//! - [`CatalogRepository`](crate::db::CatalogRepository) - `PostgreSQL`
//! - [`CachedCatalog`] - `moka` cache in front of another catalog
//! - [`StaticCatalog`] - fixed in-memory catalog for tests and demos

mod cache;
mod memory;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use temple_pos_core::{CartItemDescriptor, Price, ProductId};

use crate::db::RepositoryError;

pub use cache::CachedCatalog;
pub use memory::StaticCatalog;

/// Errors from catalog lookups.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What a catalog product is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// A scheduled temple event; stock is the number of open seats.
    Event,
    /// A donation or service plan; stock is the number of open slots.
    Plan,
}

impl ProductKind {
    /// Value stored in the `kind` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Plan => "plan",
        }
    }

    /// Plural label for headings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Event => "Events",
            Self::Plan => "Plans",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event" => Ok(Self::Event),
            "plan" => Ok(Self::Plan),
            other => Err(format!("unknown product kind: {other}")),
        }
    }
}

/// A product offered for sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub kind: ProductKind,
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
    /// Units still available.
    pub stock: u32,
    pub image_url: Option<String>,
    /// Start time for events.
    pub starts_at: Option<DateTime<Utc>>,
}

impl CatalogProduct {
    /// The product data a cart line is built from.
    #[must_use]
    pub fn descriptor(&self) -> CartItemDescriptor {
        CartItemDescriptor {
            product_id: self.id,
            title: self.title.clone(),
            unit_price: self.price,
            max_quantity: self.stock,
            image_url: self.image_url.clone(),
        }
    }

    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.stock == 0
    }
}

/// Read access to active catalog products.
///
/// Inactive products are never returned.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up one active product.
    async fn find(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError>;

    /// List active products, optionally restricted to one kind.
    async fn list(&self, kind: Option<ProductKind>) -> Result<Vec<CatalogProduct>, CatalogError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), CatalogError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use temple_pos_core::CurrencyCode;

    use super::*;

    #[test]
    fn test_descriptor_uses_stock_as_max_quantity() {
        let product = CatalogProduct {
            id: ProductId::new(12),
            kind: ProductKind::Event,
            title: "Diwali lamp lighting".to_string(),
            description: None,
            price: Price::from_cents(1500, CurrencyCode::USD).unwrap(),
            stock: 40,
            image_url: Some("https://cdn.example.org/diwali.jpg".to_string()),
            starts_at: None,
        };

        let descriptor = product.descriptor();
        assert_eq!(descriptor.product_id, ProductId::new(12));
        assert_eq!(descriptor.max_quantity, 40);
        assert_eq!(descriptor.unit_price, product.price);
        assert!(!product.is_sold_out());
    }

    #[test]
    fn test_product_kind_round_trip() {
        for kind in [ProductKind::Event, ProductKind::Plan] {
            assert_eq!(kind.as_str().parse::<ProductKind>().unwrap(), kind);
        }
        assert!("raffle".parse::<ProductKind>().is_err());
    }
}
