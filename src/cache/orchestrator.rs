//! Warm-up and mutation-driven invalidation.
//!
//! The orchestrator owns the rules that keep enumerable views coherent with the repository:
//! it warms them at start and, after each committed mutation, refreshes or evicts every view
//! the mutation can have touched.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tracing::{debug, error, info, instrument, warn};

use crate::application::repos::{CatalogRepo, RepoError};
use crate::domain::entities::{Category, Item};
use crate::domain::types::{CategoryChange, ItemChange};

use super::backend::CacheError;
use super::events::CatalogEvent;
use super::keys::QueryShape;
use super::planner::InvalidationPlan;
use super::stores::{CacheStores, CachedView};

const SOURCE: &str = "cache::orchestrator";

pub(crate) const METRIC_CACHE_WARM_MS: &str = "bazaar_cache_warm_ms";
pub(crate) const METRIC_CACHE_INVALIDATE_MS: &str = "bazaar_cache_invalidate_ms";

/// A cache write that failed during warm-up.
#[derive(Debug)]
pub struct WarmFailure {
    pub key: String,
    pub error: CacheError,
}

#[derive(Debug, Default)]
pub struct WarmReport {
    pub warmed: usize,
    pub failures: Vec<WarmFailure>,
}

impl WarmReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub enum InvalidationFailure {
    /// Recomputing the view failed; the entry was evicted instead.
    Repository { key: String, error: RepoError },
    Cache { key: String, error: CacheError },
    /// The plan task panicked or was cancelled by the runtime.
    Aborted(String),
}

impl fmt::Display for InvalidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationFailure::Repository { key, error } => {
                write!(f, "recompute of `{key}` failed: {error}")
            }
            InvalidationFailure::Cache { key, error } => write!(f, "`{key}`: {error}"),
            InvalidationFailure::Aborted(reason) => write!(f, "plan aborted: {reason}"),
        }
    }
}

/// Outcome of one invalidation. Failures are soft: the mutation is already committed.
#[derive(Debug, Default)]
pub struct InvalidationReport {
    pub refreshed: usize,
    pub evicted: usize,
    pub failures: Vec<InvalidationFailure>,
}

impl InvalidationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Log the outcome on behalf of the use case that triggered it.
    pub fn log(&self, operation: &'static str) {
        if self.is_clean() {
            debug!(
                target = SOURCE,
                operation,
                refreshed = self.refreshed,
                evicted = self.evicted,
                "Cache invalidation finished"
            );
            return;
        }
        let failures: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        warn!(
            target = SOURCE,
            operation,
            refreshed = self.refreshed,
            evicted = self.evicted,
            failures = ?failures,
            "Cache invalidation finished with failures"
        );
    }
}

#[derive(Clone)]
pub struct CacheOrchestrator {
    stores: CacheStores,
    repo: Arc<dyn CatalogRepo>,
}

impl CacheOrchestrator {
    pub fn new(stores: CacheStores, repo: Arc<dyn CatalogRepo>) -> Self {
        Self { stores, repo }
    }

    pub fn stores(&self) -> &CacheStores {
        &self.stores
    }

    /// Populate every enumerable view.
    ///
    /// Repository errors abort the warm-up. Cache write errors are recorded in the report.
    #[instrument(skip(self))]
    pub async fn warm_up(&self) -> Result<WarmReport, RepoError> {
        let started_at = Instant::now();
        let mut report = WarmReport::default();

        let categories = self.repo.list_categories().await?;
        let mut shapes: Vec<QueryShape> = QueryShape::default_item_lists().collect();
        shapes.push(QueryShape::ItemsQuantity);
        for category in &categories {
            shapes.extend(QueryShape::default_category_lists(&category.name));
            shapes.push(QueryShape::quantity_of(&category.name));
        }

        self.record_warm(
            &mut report,
            &QueryShape::AllCategories,
            &CachedView::Categories(categories),
        )
        .await;

        for shape in &shapes {
            let view = self.fetch(shape).await?;
            self.record_warm(&mut report, shape, &view).await;
        }

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_CACHE_WARM_MS).record(elapsed_ms);
        info!(
            target = SOURCE,
            warmed = report.warmed,
            failures = report.failures.len(),
            elapsed_ms,
            "Cache warm-up finished"
        );
        Ok(report)
    }

    #[instrument(skip(self, item), fields(item_id = %item.id, category = %item.category.name))]
    pub async fn on_item_mutated(&self, item: &Item, change: ItemChange) -> InvalidationReport {
        let event = CatalogEvent::for_item(item, change);
        self.apply(vec![event]).await
    }

    #[instrument(skip(self, category), fields(category_id = %category.id, name = %category.name))]
    pub async fn on_category_mutated(
        &self,
        category: &Category,
        change: CategoryChange,
    ) -> InvalidationReport {
        let event = CatalogEvent::for_category(category, change);
        self.apply(vec![event]).await
    }

    /// Plan and execute on a separate task so a dropped caller cannot abandon it half-way.
    pub async fn apply(&self, events: Vec<CatalogEvent>) -> InvalidationReport {
        let kinds: Vec<&'static str> = events.iter().map(CatalogEvent::kind).collect();
        let plan = InvalidationPlan::from_events(events);
        if plan.is_empty() {
            return InvalidationReport::default();
        }

        info!(target = SOURCE, events = ?kinds, plan = %plan, "Cache invalidation starting");
        debug!(
            target = SOURCE,
            ttl_seconds = self.stores.backend().default_ttl().as_secs(),
            "Non-default pages and search results are left to expire"
        );

        let this = self.clone();
        match tokio::spawn(async move { this.execute(plan).await }).await {
            Ok(report) => report,
            Err(err) => {
                error!(target = SOURCE, error = %err, "Cache invalidation task failed");
                InvalidationReport {
                    failures: vec![InvalidationFailure::Aborted(err.to_string())],
                    ..InvalidationReport::default()
                }
            }
        }
    }

    async fn execute(&self, plan: InvalidationPlan) -> InvalidationReport {
        let started_at = Instant::now();
        let mut report = InvalidationReport::default();

        for shape in &plan.evict {
            self.evict_into(&mut report, shape).await;
        }

        for shape in &plan.refresh {
            match self.fetch(shape).await {
                Ok(view) => match self.stores.store(shape, &view).await {
                    Ok(()) => report.refreshed += 1,
                    Err(error) => report.failures.push(InvalidationFailure::Cache {
                        key: shape.cache_key(),
                        error,
                    }),
                },
                Err(error) => {
                    report.failures.push(InvalidationFailure::Repository {
                        key: shape.cache_key(),
                        error,
                    });
                    // Never leave a stale entry behind a failed recompute.
                    self.evict_into(&mut report, shape).await;
                }
            }
        }

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_CACHE_INVALIDATE_MS).record(elapsed_ms);
        report
    }

    async fn evict_into(&self, report: &mut InvalidationReport, shape: &QueryShape) {
        match self.stores.evict(shape).await {
            Ok(()) => report.evicted += 1,
            Err(error) => report.failures.push(InvalidationFailure::Cache {
                key: shape.cache_key(),
                error,
            }),
        }
    }

    async fn record_warm(&self, report: &mut WarmReport, shape: &QueryShape, view: &CachedView) {
        match self.stores.store(shape, view).await {
            Ok(()) => report.warmed += 1,
            Err(error) => {
                warn!(
                    target = SOURCE,
                    key = %shape.cache_key(),
                    error = %error,
                    "Warm-up write failed"
                );
                report.failures.push(WarmFailure {
                    key: shape.cache_key(),
                    error,
                });
            }
        }
    }

    /// Recompute the view for `shape` from the repository.
    async fn fetch(&self, shape: &QueryShape) -> Result<CachedView, RepoError> {
        let view = match shape {
            QueryShape::AllItems { sort, page } => {
                CachedView::Items(self.repo.list_items(*sort, page.offset, page.limit).await?)
            }
            QueryShape::ItemsByCategory {
                category,
                sort,
                page,
            } => CachedView::Items(
                self.repo
                    .list_items_by_category(category, *sort, page.offset, page.limit)
                    .await?,
            ),
            QueryShape::SearchLine { term, page } => CachedView::Items(
                self.repo
                    .search_items(term, page.offset, page.limit)
                    .await?,
            ),
            QueryShape::AllCategories => CachedView::Categories(self.repo.list_categories().await?),
            QueryShape::ItemsQuantity => CachedView::Quantity(self.repo.count_items().await?),
            QueryShape::ItemsQuantityByCategory { category } => {
                CachedView::Quantity(self.repo.count_items_by_category(category).await?)
            }
        };
        Ok(view)
    }
}
