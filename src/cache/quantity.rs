//! Counter cache for item totals.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::backend::{CacheBackend, CacheError};
use super::entity::{checked_key, record_hit, record_miss, write};
use super::keys::{QueryShape, ShapeFamily};

const SOURCE: &str = "cache::quantity";

/// Stores counts as decimal strings under `ItemsQuantity` and `ItemsQuantityByCategory`.
#[derive(Clone)]
pub struct QuantityCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl QuantityCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub async fn get(&self, shape: &QueryShape) -> Option<u64> {
        let key = match checked_key(shape, ShapeFamily::Quantity) {
            Ok(key) => key,
            Err(err) => {
                warn!(target = SOURCE, error = %err, "Rejected cache read");
                return None;
            }
        };

        match self.backend.get(&key).await {
            Ok(Some(payload)) => match payload.parse::<u64>() {
                Ok(count) => {
                    record_hit(shape);
                    Some(count)
                }
                Err(err) => {
                    warn!(
                        target = SOURCE,
                        key = %key,
                        error = %err,
                        "Cached counter could not be decoded"
                    );
                    record_miss(shape);
                    None
                }
            },
            Ok(None) => {
                record_miss(shape);
                None
            }
            Err(err) => {
                warn!(target = SOURCE, key = %key, error = %err, "Cache read failed");
                record_miss(shape);
                None
            }
        }
    }

    pub async fn put(&self, shape: &QueryShape, count: u64) -> Result<(), CacheError> {
        let key = checked_key(shape, ShapeFamily::Quantity)?;
        write(self.backend.as_ref(), shape, &key, count.to_string(), self.ttl).await
    }

    pub async fn evict(&self, shape: &QueryShape) -> Result<(), CacheError> {
        let key = checked_key(shape, ShapeFamily::Quantity)?;
        self.backend.delete(&key).await
    }
}
