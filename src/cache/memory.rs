//! Process-local backend with per-entry expiry.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::backend::{CacheBackend, CacheError, OpGate};

#[derive(Debug)]
struct MemoryEntry {
    payload: String,
    expires_at: Instant,
}

/// `DashMap`-backed store. Expired entries are dropped lazily on read.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: DashMap<String, MemoryEntry>,
    default_ttl: Duration,
    gate: OpGate,
}

impl MemoryBackend {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            gate: OpGate::default(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    fn live_payload(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.payload.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        None
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let _guard = self.gate.enter()?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        match self.gate.enter() {
            Ok(_guard) => self.live_payload(key).is_some(),
            Err(_) => false,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let _guard = self.gate.enter()?;
        Ok(self.live_payload(key))
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError> {
        let _guard = self.gate.enter()?;
        if ttl.is_zero() {
            return Err(CacheError::Backend(format!("ttl for `{key}` must be positive")));
        }
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _guard = self.gate.enter()?;
        self.entries.remove(key);
        Ok(())
    }

    async fn shutdown(&self, timeout: Duration) -> Result<(), CacheError> {
        self.gate.close(timeout).await
    }
}
