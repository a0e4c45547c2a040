//! Fixed in-memory catalog.

use async_trait::async_trait;

use temple_pos_core::ProductId;

use super::{CatalogError, CatalogProduct, ProductCatalog, ProductKind};

/// A catalog backed by a fixed list of products.
///
/// Listing preserves the order the products were given in.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<CatalogProduct>,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new(products: Vec<CatalogProduct>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn find(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, kind: Option<ProductKind>) -> Result<Vec<CatalogProduct>, CatalogError> {
        Ok(self
            .products
            .iter()
            .filter(|p| kind.is_none_or(|k| p.kind == k))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}
