//! Key/value backend contract shared by the typed caches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Notify;

use super::config::{BackendKind, CacheConfig};
use super::memory::MemoryBackend;
use super::redis::RedisBackend;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend `{endpoint}` is unreachable: {reason}")]
    Connection { endpoint: String, reason: String },
    #[error("cache payload for `{key}` could not be encoded: {reason}")]
    Serialization { key: String, reason: String },
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache backend is shut down")]
    Closed,
    #[error("cache shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),
    #[error("shape `{key}` is not a {expected} shape")]
    ShapeMismatch { key: String, expected: &'static str },
}

impl CacheError {
    pub fn connection(endpoint: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// A remote or local string store with per-entry expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;

    fn default_ttl(&self) -> Duration;

    async fn ping(&self) -> Result<(), CacheError>;

    /// Fails open: any backend error reads as `false`.
    async fn exists(&self, key: &str) -> bool;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `payload` under `key`, replacing any previous value, expiring after `ttl`.
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Refuse new operations and wait up to `timeout` for in-flight ones.
    async fn shutdown(&self, timeout: Duration) -> Result<(), CacheError>;
}

/// Open the backend selected in configuration. Failure here is fatal at start.
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    match config.backend {
        BackendKind::Redis => {
            let backend = RedisBackend::connect(config).await?;
            Ok(Arc::new(backend))
        }
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new(config.ttl))),
    }
}

/// Tracks in-flight operations so shutdown can drain them.
#[derive(Debug, Default)]
pub(crate) struct OpGate {
    closed: AtomicBool,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl OpGate {
    pub(crate) fn enter(&self) -> Result<OpGuard<'_>, CacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = OpGuard { gate: self };
        // Shutdown may have started between the check and the increment.
        if self.closed.load(Ordering::Acquire) {
            drop(guard);
            return Err(CacheError::Closed);
        }
        Ok(guard)
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) async fn close(&self, timeout: Duration) -> Result<(), CacheError> {
        self.closed.store(true, Ordering::Release);
        let drained = async {
            loop {
                let notified = self.idle.notified();
                if self.in_flight.load(Ordering::Acquire) == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, drained)
            .await
            .map_err(|_| CacheError::ShutdownTimeout(timeout))
    }
}

pub(crate) struct OpGuard<'a> {
    gate: &'a OpGate,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        if self.gate.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.gate.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_gate_refuses_new_operations() {
        let gate = OpGate::default();
        gate.close(Duration::from_millis(10))
            .await
            .expect("idle gate closes immediately");
        assert!(gate.is_closed());
        assert!(matches!(gate.enter(), Err(CacheError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn close_times_out_while_operations_are_in_flight() {
        let gate = OpGate::default();
        let _held = gate.enter().expect("open gate");

        let err = gate
            .close(Duration::from_secs(2))
            .await
            .expect_err("operation never finishes");
        assert!(matches!(err, CacheError::ShutdownTimeout(t) if t == Duration::from_secs(2)));
        assert_eq!(gate.in_flight(), 1);
    }

    #[tokio::test]
    async fn close_waits_for_in_flight_operations() {
        let gate = Arc::new(OpGate::default());
        let guard_gate = Arc::clone(&gate);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel::<()>();

        let worker = tokio::spawn(async move {
            let _guard = guard_gate.enter().expect("open gate");
            let _ = entered_tx.send(());
            let _ = release_rx.await;
        });

        entered_rx.await.expect("worker entered");
        let closing = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.close(Duration::from_secs(5)).await })
        };
        release_tx.send(()).expect("worker waiting");
        worker.await.expect("worker finished");

        closing
            .await
            .expect("close task")
            .expect("drained before timeout");
        assert_eq!(gate.in_flight(), 0);
    }
}
