//! Typed list caches over the shared backend.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::entities::{Category, Item};

use super::backend::{CacheBackend, CacheError};
use super::keys::{QueryShape, ShapeFamily};

const SOURCE: &str = "cache::entity";

pub(crate) const METRIC_CACHE_HIT: &str = "bazaar_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "bazaar_cache_miss_total";
pub(crate) const METRIC_CACHE_WRITE_ERROR: &str = "bazaar_cache_write_error_total";

/// Entities that can be cached as a JSON list.
pub trait CachedEntity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const FAMILY: ShapeFamily;
}

impl CachedEntity for Item {
    const FAMILY: ShapeFamily = ShapeFamily::ItemList;
}

impl CachedEntity for Category {
    const FAMILY: ShapeFamily = ShapeFamily::CategoryList;
}

/// Read-through list cache for one entity type.
///
/// Reads never fail: a missing key, an undecodable payload and a backend error all come back
/// as `None`, and the caller recomputes. Writes surface their errors.
pub struct EntityCache<T> {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            ttl: self.ttl,
            _entity: PhantomData,
        }
    }
}

impl<T: CachedEntity> EntityCache<T> {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            _entity: PhantomData,
        }
    }

    pub async fn get(&self, shape: &QueryShape) -> Option<Vec<T>> {
        let key = match checked_key(shape, T::FAMILY) {
            Ok(key) => key,
            Err(err) => {
                warn!(target = SOURCE, error = %err, "Rejected cache read");
                return None;
            }
        };

        let payload = match self.backend.get(&key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                record_miss(shape);
                return None;
            }
            Err(err) => {
                warn!(target = SOURCE, key = %key, error = %err, "Cache read failed");
                record_miss(shape);
                return None;
            }
        };

        match serde_json::from_str::<Vec<T>>(&payload) {
            Ok(entries) => {
                record_hit(shape);
                Some(entries)
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    key = %key,
                    error = %err,
                    "Cached payload could not be decoded"
                );
                record_miss(shape);
                None
            }
        }
    }

    /// Replace the entry for `shape` with `entries`.
    ///
    /// The payload is fully encoded before the single `SET`, so a dropped caller stores either
    /// the whole list or nothing.
    pub async fn put(&self, shape: &QueryShape, entries: &[T]) -> Result<(), CacheError> {
        let key = checked_key(shape, T::FAMILY)?;
        let payload = serde_json::to_string(entries).map_err(|err| CacheError::Serialization {
            key: key.clone(),
            reason: err.to_string(),
        })?;
        write(self.backend.as_ref(), shape, &key, payload, self.ttl).await
    }

    pub async fn evict(&self, shape: &QueryShape) -> Result<(), CacheError> {
        let key = checked_key(shape, T::FAMILY)?;
        self.backend.delete(&key).await
    }

    pub async fn exists(&self, shape: &QueryShape) -> bool {
        match checked_key(shape, T::FAMILY) {
            Ok(key) => self.backend.exists(&key).await,
            Err(_) => false,
        }
    }
}

pub(crate) fn checked_key(shape: &QueryShape, expected: ShapeFamily) -> Result<String, CacheError> {
    if shape.family() != expected {
        return Err(CacheError::ShapeMismatch {
            key: shape.cache_key(),
            expected: expected.as_str(),
        });
    }
    Ok(shape.cache_key())
}

pub(crate) async fn write(
    backend: &dyn CacheBackend,
    shape: &QueryShape,
    key: &str,
    payload: String,
    ttl: Duration,
) -> Result<(), CacheError> {
    let result = backend.set(key, payload, ttl).await;
    if result.is_err() {
        counter!(METRIC_CACHE_WRITE_ERROR, "view" => shape.label()).increment(1);
    }
    result
}

pub(crate) fn record_hit(shape: &QueryShape) {
    counter!(METRIC_CACHE_HIT, "view" => shape.label()).increment(1);
}

pub(crate) fn record_miss(shape: &QueryShape) {
    counter!(METRIC_CACHE_MISS, "view" => shape.label()).increment(1);
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::application::pagination::PageRequest;
    use crate::cache::memory::MemoryBackend;
    use crate::domain::types::SortOption;

    fn category(name: &str) -> Category {
        let now = OffsetDateTime::UNIX_EPOCH;
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn cache() -> (Arc<MemoryBackend>, EntityCache<Category>) {
        let backend = Arc::new(MemoryBackend::default());
        let cache = EntityCache::new(backend.clone(), Duration::from_secs(60));
        (backend, cache)
    }

    #[tokio::test]
    async fn put_then_get_returns_the_same_list() {
        let (_, cache) = cache();
        let categories = vec![category("Kitchen"), category("Garden")];

        cache
            .put(&QueryShape::AllCategories, &categories)
            .await
            .expect("put");

        assert_eq!(cache.get(&QueryShape::AllCategories).await, Some(categories));
        assert!(cache.exists(&QueryShape::AllCategories).await);
    }

    #[tokio::test]
    async fn empty_lists_are_cached_as_hits() {
        let (_, cache) = cache();
        cache.put(&QueryShape::AllCategories, &[]).await.expect("put");
        assert_eq!(cache.get(&QueryShape::AllCategories).await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn undecodable_payload_reads_as_miss() {
        let (backend, cache) = cache();
        backend
            .set(
                &QueryShape::AllCategories.cache_key(),
                "{not json".into(),
                Duration::from_secs(60),
            )
            .await
            .expect("raw set");

        assert_eq!(cache.get(&QueryShape::AllCategories).await, None);
    }

    #[tokio::test]
    async fn wrong_family_is_rejected() {
        let (_, cache) = cache();
        let shape = QueryShape::AllItems {
            sort: SortOption::NameAsc,
            page: PageRequest::first(),
        };

        let err = cache.put(&shape, &[]).await.expect_err("item shape");
        assert!(matches!(
            err,
            CacheError::ShapeMismatch { expected: "category list", .. }
        ));
        assert_eq!(cache.get(&shape).await, None);
    }

    #[tokio::test]
    async fn evict_removes_the_entry() {
        let (backend, cache) = cache();
        cache
            .put(&QueryShape::AllCategories, &[category("Kitchen")])
            .await
            .expect("put");
        cache.evict(&QueryShape::AllCategories).await.expect("evict");
        assert!(backend.is_empty());
    }
}
