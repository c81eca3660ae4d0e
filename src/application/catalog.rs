//! Read paths over the catalog, served from the query cache when possible.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::application::pagination::PageRequest;
use crate::application::repos::{CatalogRepo, RepoError};
use crate::cache::{CacheStores, CachedEntity, EntityCache, QueryShape};
use crate::domain::entities::{Category, Item};
use crate::domain::error::DomainError;
use crate::domain::types::SortOption;

const SOURCE: &str = "application::catalog";

/// Errors surfaced by catalog use cases.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepo>,
    cache: CacheStores,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepo>, cache: CacheStores) -> Self {
        Self { repo, cache }
    }

    pub async fn items_list(
        &self,
        sort: SortOption,
        page: PageRequest,
    ) -> Result<Vec<Item>, CatalogError> {
        let shape = QueryShape::AllItems { sort, page };
        if let Some(items) = self.cache.items.get(&shape).await {
            return Ok(items);
        }
        let items = self.repo.list_items(sort, page.offset, page.limit).await?;
        remember(&self.cache.items, &shape, &items).await;
        Ok(items)
    }

    pub async fn items_by_category(
        &self,
        category: &str,
        sort: SortOption,
        page: PageRequest,
    ) -> Result<Vec<Item>, CatalogError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(DomainError::validation("category", "must not be empty").into());
        }
        let shape = QueryShape::ItemsByCategory {
            category: category.to_string(),
            sort,
            page,
        };
        if let Some(items) = self.cache.items.get(&shape).await {
            return Ok(items);
        }
        let items = self
            .repo
            .list_items_by_category(category, sort, page.offset, page.limit)
            .await?;
        remember(&self.cache.items, &shape, &items).await;
        Ok(items)
    }

    /// Search is case-insensitive, so the term is cached in lowercase.
    pub async fn search_items(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<Vec<Item>, CatalogError> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Err(DomainError::validation("q", "must not be empty").into());
        }
        let shape = QueryShape::SearchLine {
            term: term.clone(),
            page,
        };
        if let Some(items) = self.cache.items.get(&shape).await {
            return Ok(items);
        }
        let items = self
            .repo
            .search_items(&term, page.offset, page.limit)
            .await?;
        remember(&self.cache.items, &shape, &items).await;
        Ok(items)
    }

    pub async fn category_list(&self) -> Result<Vec<Category>, CatalogError> {
        let shape = QueryShape::AllCategories;
        if let Some(categories) = self.cache.categories.get(&shape).await {
            return Ok(categories);
        }
        let categories = self.repo.list_categories().await?;
        remember(&self.cache.categories, &shape, &categories).await;
        Ok(categories)
    }

    pub async fn items_quantity(&self) -> Result<u64, CatalogError> {
        let shape = QueryShape::ItemsQuantity;
        if let Some(count) = self.cache.quantities.get(&shape).await {
            return Ok(count);
        }
        let count = self.repo.count_items().await?;
        self.remember_count(&shape, count).await;
        Ok(count)
    }

    pub async fn items_quantity_by_category(&self, category: &str) -> Result<u64, CatalogError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(DomainError::validation("category", "must not be empty").into());
        }
        let shape = QueryShape::quantity_of(category);
        if let Some(count) = self.cache.quantities.get(&shape).await {
            return Ok(count);
        }
        let count = self.repo.count_items_by_category(category).await?;
        self.remember_count(&shape, count).await;
        Ok(count)
    }

    async fn remember_count(&self, shape: &QueryShape, count: u64) {
        if let Err(err) = self.cache.quantities.put(shape, count).await {
            warn!(
                target = SOURCE,
                key = %shape.cache_key(),
                error = %err,
                "Failed to cache recomputed counter"
            );
        }
    }
}

/// Store a recomputed list; the read itself already succeeded, so failures are only logged.
async fn remember<T: CachedEntity>(cache: &EntityCache<T>, shape: &QueryShape, entries: &[T]) {
    if let Err(err) = cache.put(shape, entries).await {
        warn!(
            target = SOURCE,
            key = %shape.cache_key(),
            error = %err,
            "Failed to cache recomputed list"
        );
    }
}
