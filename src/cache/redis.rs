//! Redis backend over a multiplexed, auto-reconnecting connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisError};
use tracing::{info, warn};

use super::backend::{CacheBackend, CacheError, OpGate};
use super::config::CacheConfig;

const SOURCE: &str = "cache::redis";

/// Reconnect attempts after the first one. Start-up fails on the first refusal.
const RECONNECT_RETRIES: usize = 0;

pub struct RedisBackend {
    connection: ConnectionManager,
    endpoint: String,
    default_ttl: Duration,
    operation_timeout: Duration,
    gate: OpGate,
}

impl RedisBackend {
    /// Connect and verify the server answers `PING` within the connect timeout.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let endpoint = config.endpoint();
        let client = redis::Client::open(endpoint.as_str())
            .map_err(|err| CacheError::connection(&endpoint, err))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(RECONNECT_RETRIES)
            .set_connection_timeout(config.connect_timeout)
            .set_response_timeout(config.operation_timeout);

        let connection = tokio::time::timeout(config.connect_timeout, async {
            let mut connection = ConnectionManager::new_with_config(client, manager_config).await?;
            let _: () = redis::cmd("PING").query_async(&mut connection).await?;
            Ok::<_, RedisError>(connection)
        })
        .await
        .map_err(|_| {
            CacheError::connection(
                &endpoint,
                format!("no answer within {:?}", config.connect_timeout),
            )
        })?
        .map_err(|err| CacheError::connection(&endpoint, err))?;

        info!(
            target = SOURCE,
            endpoint = %endpoint,
            ttl_seconds = config.ttl.as_secs(),
            "Connected to redis"
        );

        Ok(Self {
            connection,
            endpoint,
            default_ttl: config.ttl,
            operation_timeout: config.operation_timeout,
            gate: OpGate::default(),
        })
    }

    /// Run one command, bounded by the operation timeout.
    async fn bounded<T>(
        &self,
        command: &'static str,
        operation: impl Future<Output = Result<T, RedisError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.operation_timeout, operation).await {
            Ok(result) => result.map_err(|err| self.map_error(err)),
            Err(_) => Err(self.timed_out(command)),
        }
    }

    fn timed_out(&self, command: &str) -> CacheError {
        CacheError::Backend(format!(
            "{command} on `{}` got no answer within {:?}",
            self.endpoint, self.operation_timeout
        ))
    }

    fn map_error(&self, err: RedisError) -> CacheError {
        if err.is_timeout() {
            CacheError::backend(err)
        } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            CacheError::connection(&self.endpoint, err)
        } else {
            CacheError::backend(err)
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let _guard = self.gate.enter()?;
        let mut connection = self.connection.clone();
        let _: () = self
            .bounded("PING", redis::cmd("PING").query_async(&mut connection))
            .await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        let Ok(_guard) = self.gate.enter() else {
            return false;
        };
        let mut connection = self.connection.clone();
        let found: Result<bool, CacheError> =
            self.bounded("EXISTS", connection.exists(key)).await;
        match found {
            Ok(found) => found,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    key,
                    error = %err,
                    "EXISTS failed; treating key as absent"
                );
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let _guard = self.gate.enter()?;
        let mut connection = self.connection.clone();
        self.bounded("GET", connection.get(key)).await
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError> {
        let _guard = self.gate.enter()?;
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return Err(CacheError::Backend(format!(
                "ttl for `{key}` must be at least one second"
            )));
        }
        let mut connection = self.connection.clone();
        let mut command = redis::cmd("SET");
        command.arg(key).arg(payload).arg("EX").arg(seconds);
        let _: () = self
            .bounded("SET", command.query_async(&mut connection))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _guard = self.gate.enter()?;
        let mut connection = self.connection.clone();
        let _: () = self
            .bounded("DEL", redis::cmd("DEL").arg(key).query_async(&mut connection))
            .await?;
        Ok(())
    }

    async fn shutdown(&self, timeout: Duration) -> Result<(), CacheError> {
        self.gate.close(timeout).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::Instant;

    use super::*;

    /// Length of the first complete RESP command in `buf`, if one has fully arrived.
    fn command_len(buf: &[u8]) -> Option<usize> {
        let (args, mut pos) = resp_header(buf, 0, b'*')?;
        for _ in 0..args {
            let (len, next) = resp_header(buf, pos, b'$')?;
            pos = next + len + 2;
            if pos > buf.len() {
                return None;
            }
        }
        Some(pos)
    }

    fn resp_header(buf: &[u8], start: usize, marker: u8) -> Option<(usize, usize)> {
        if *buf.get(start)? != marker {
            return None;
        }
        let end = start + buf[start..].windows(2).position(|w| w == b"\r\n")?;
        let value = std::str::from_utf8(&buf[start + 1..end]).ok()?.parse().ok()?;
        Some((value, end + 2))
    }

    /// Answers `+OK` to every command until `silent` is set, then reads without replying.
    async fn serve_until_silent(mut socket: TcpStream, silent: Arc<AtomicBool>) {
        let mut pending = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let read = match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(read) => read,
            };
            pending.extend_from_slice(&chunk[..read]);
            while let Some(len) = command_len(&pending) {
                pending.drain(..len);
                if silent.load(Ordering::SeqCst) {
                    continue;
                }
                if socket.write_all(b"+OK\r\n").await.is_err() {
                    return;
                }
            }
        }
    }

    async fn stalling_server(silent: Arc<AtomicBool>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve_until_silent(socket, silent.clone()));
            }
        });
        port
    }

    fn local_config(port: u16) -> CacheConfig {
        CacheConfig {
            port,
            connect_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_millis(200),
            ..CacheConfig::default()
        }
    }

    #[test]
    fn command_len_waits_for_the_whole_command() {
        let ping = b"*1\r\n$4\r\nPING\r\n";
        assert_eq!(command_len(ping), Some(ping.len()));
        assert_eq!(command_len(&ping[..ping.len() - 1]), None);
    }

    #[tokio::test]
    async fn unreachable_server_fails_connect_without_retrying() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let config = local_config(port);
        let started = Instant::now();
        let err = match RedisBackend::connect(&config).await {
            Ok(_) => panic!("nothing listens on port {port}"),
            Err(err) => err,
        };

        assert!(matches!(err, CacheError::Connection { .. }), "got {err:?}");
        assert!(started.elapsed() < config.connect_timeout);
    }

    #[tokio::test]
    async fn silent_server_turns_commands_into_backend_errors() {
        let silent = Arc::new(AtomicBool::new(false));
        let port = stalling_server(silent.clone()).await;
        let config = local_config(port);

        let backend = RedisBackend::connect(&config)
            .await
            .expect("server answers during connect");
        backend.ping().await.expect("server still answering");

        silent.store(true, Ordering::SeqCst);

        let started = Instant::now();
        let err = backend
            .get("catalog:quantity:items")
            .await
            .expect_err("no reply from server");
        assert!(matches!(err, CacheError::Backend(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(2));

        assert!(!backend.exists("catalog:quantity:items").await);
        assert!(matches!(
            backend
                .set("catalog:quantity:items", "1".into(), Duration::from_secs(60))
                .await,
            Err(CacheError::Backend(_))
        ));
    }
}
