//! The explicit bundle of typed caches handed to services.

use std::sync::Arc;

use crate::domain::entities::{Category, Item};

use super::backend::{CacheBackend, CacheError};
use super::entity::EntityCache;
use super::keys::{QueryShape, ShapeFamily};
use super::quantity::QuantityCache;

/// One backend and the three typed views over it.
#[derive(Clone)]
pub struct CacheStores {
    backend: Arc<dyn CacheBackend>,
    pub items: EntityCache<Item>,
    pub categories: EntityCache<Category>,
    pub quantities: QuantityCache,
}

impl CacheStores {
    /// Build the typed caches, all writing with the backend's default TTL.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        let ttl = backend.default_ttl();
        Self {
            items: EntityCache::new(Arc::clone(&backend), ttl),
            categories: EntityCache::new(Arc::clone(&backend), ttl),
            quantities: QuantityCache::new(Arc::clone(&backend), ttl),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Store a freshly computed view under `shape`.
    pub async fn store(&self, shape: &QueryShape, view: &CachedView) -> Result<(), CacheError> {
        match view {
            CachedView::Items(items) => self.items.put(shape, items).await,
            CachedView::Categories(categories) => self.categories.put(shape, categories).await,
            CachedView::Quantity(count) => self.quantities.put(shape, *count).await,
        }
    }

    pub async fn evict(&self, shape: &QueryShape) -> Result<(), CacheError> {
        match shape.family() {
            ShapeFamily::ItemList => self.items.evict(shape).await,
            ShapeFamily::CategoryList => self.categories.evict(shape).await,
            ShapeFamily::Quantity => self.quantities.evict(shape).await,
        }
    }
}

/// A recomputed value ready to be cached.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedView {
    Items(Vec<Item>),
    Categories(Vec<Category>),
    Quantity(u64),
}
