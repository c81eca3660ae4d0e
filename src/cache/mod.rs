//! Bazaar query cache
//!
//! Caches catalog query results in a key/value backend (Redis, or an in-process map for
//! development):
//!
//! - **Typed views**: `EntityCache<Item>`, `EntityCache<Category>` and `QuantityCache`, all
//!   keyed by a [`QueryShape`]
//! - **Orchestrator**: warms enumerable views at start and refreshes or evicts them after
//!   every committed mutation
//!
//! Views that are not enumerable (non-default pages, search results) expire through TTL only.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! host = "127.0.0.1"
//! port = 6379
//! ttl_minutes = 10
//! shutdown_timeout_seconds = 5
//! connect_timeout_seconds = 3
//! operation_timeout_millis = 500
//! ```

mod backend;
mod config;
mod entity;
mod events;
mod keys;
mod memory;
mod orchestrator;
mod planner;
mod quantity;
mod redis;
mod stores;

pub use backend::{CacheBackend, CacheError, connect};
pub use config::{BackendKind, CacheConfig};
pub use entity::{CachedEntity, EntityCache};
pub use events::CatalogEvent;
pub use keys::{QueryShape, ShapeFamily};
pub use memory::MemoryBackend;
pub use orchestrator::{
    CacheOrchestrator, InvalidationFailure, InvalidationReport, WarmFailure, WarmReport,
};
pub use planner::InvalidationPlan;
pub use quantity::QuantityCache;
pub use self::redis::RedisBackend;
pub use stores::{CacheStores, CachedView};

pub(crate) mod metric_names {
    pub(crate) use super::entity::{
        METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_WRITE_ERROR,
    };
    pub(crate) use super::orchestrator::{METRIC_CACHE_INVALIDATE_MS, METRIC_CACHE_WARM_MS};
}
