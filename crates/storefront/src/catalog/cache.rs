//! Cached catalog lookups using `moka`.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, instrument};

use temple_pos_core::ProductId;

use super::{CatalogError, CatalogProduct, ProductCatalog, ProductKind};

/// Cache key for products and listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Listing(Option<ProductKind>),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<CatalogProduct>),
    Listing(Vec<CatalogProduct>),
}

/// A catalog that caches another catalog's answers for a fixed TTL.
///
/// Misses are not cached, so a newly published product shows up on the next
/// lookup. Stock figures may lag by up to one TTL; the cart clamps against
/// whatever stock it was given.
pub struct CachedCatalog<C> {
    inner: C,
    cache: Cache<CacheKey, CacheValue>,
}

impl<C: ProductCatalog> CachedCatalog<C> {
    #[must_use]
    pub fn new(inner: C, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }
}

#[async_trait]
impl<C: ProductCatalog> ProductCatalog for CachedCatalog<C> {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn find(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        let cache_key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product = self.inner.find(id).await?;
        if let Some(product) = &product {
            self.cache
                .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list(&self, kind: Option<ProductKind>) -> Result<Vec<CatalogProduct>, CatalogError> {
        let cache_key = CacheKey::Listing(kind);
        if let Some(CacheValue::Listing(products)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for listing");
            return Ok(products);
        }

        let products = self.inner.list(kind).await?;
        self.cache
            .insert(cache_key, CacheValue::Listing(products.clone()))
            .await;
        Ok(products)
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        self.inner.ping().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use temple_pos_core::{CurrencyCode, Price};

    use super::*;
    use crate::catalog::StaticCatalog;

    struct CountingCatalog {
        inner: StaticCatalog,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProductCatalog for CountingCatalog {
        async fn find(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find(id).await
        }

        async fn list(
            &self,
            kind: Option<ProductKind>,
        ) -> Result<Vec<CatalogProduct>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list(kind).await
        }

        async fn ping(&self) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    fn catalog() -> CachedCatalog<CountingCatalog> {
        let product = CatalogProduct {
            id: ProductId::new(1),
            kind: ProductKind::Plan,
            title: "Monthly annadanam".to_string(),
            description: None,
            price: Price::from_cents(5100, CurrencyCode::USD).unwrap(),
            stock: 12,
            image_url: None,
            starts_at: None,
        };
        CachedCatalog::new(
            CountingCatalog {
                inner: StaticCatalog::new(vec![product]),
                calls: AtomicUsize::new(0),
            },
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_hits_are_served_from_cache() {
        let catalog = catalog();
        for _ in 0..3 {
            assert!(catalog.find(ProductId::new(1)).await.unwrap().is_some());
        }
        assert_eq!(catalog.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let catalog = catalog();
        for _ in 0..2 {
            assert!(catalog.find(ProductId::new(99)).await.unwrap().is_none());
        }
        assert_eq!(catalog.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listings_cached_per_kind() {
        let catalog = catalog();
        assert_eq!(catalog.list(Some(ProductKind::Plan)).await.unwrap().len(), 1);
        assert_eq!(catalog.list(Some(ProductKind::Plan)).await.unwrap().len(), 1);
        assert!(catalog.list(Some(ProductKind::Event)).await.unwrap().is_empty());
        assert_eq!(catalog.inner.calls.load(Ordering::SeqCst), 2);
    }
}
