//! Cache configuration.
//!
//! Resolved from the `[cache]` section of `bazaar.toml`:
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! host = "127.0.0.1"
//! port = 6379
//! ttl_minutes = 10
//! ```

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;
const DEFAULT_TTL_MINUTES: u64 = 10;
const DEFAULT_SHUTDOWN_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 3;
const DEFAULT_OPERATION_TIMEOUT_MILLIS: u64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Redis,
    /// Process-local store, for development and tests.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub backend: BackendKind,
    pub host: String,
    pub port: u16,
    pub ttl: Duration,
    pub shutdown_timeout: Duration,
    pub connect_timeout: Duration,
    /// Upper bound on a single command once connected.
    pub operation_timeout: Duration,
}

impl CacheConfig {
    pub fn endpoint(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }

    pub fn memory(ttl: Duration) -> Self {
        Self {
            backend: BackendKind::Memory,
            ttl,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ttl: Duration::from_secs(DEFAULT_TTL_MINUTES * 60),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECONDS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MILLIS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            host: settings.host.clone(),
            port: settings.port,
            ttl: Duration::from_secs(u64::from(settings.ttl_minutes.get()) * 60),
            shutdown_timeout: Duration::from_secs(u64::from(
                settings.shutdown_timeout_seconds.get(),
            )),
            connect_timeout: Duration::from_secs(u64::from(
                settings.connect_timeout_seconds.get(),
            )),
            operation_timeout: Duration::from_millis(u64::from(
                settings.operation_timeout_millis.get(),
            )),
        }
    }
}
