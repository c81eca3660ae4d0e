//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::BackendKind;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "bazaar";
const ENV_PREFIX: &str = "BAZAAR";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_HOST: &str = "127.0.0.1";
const DEFAULT_CACHE_PORT: u16 = 6379;
const DEFAULT_CACHE_TTL_MINUTES: u64 = 10;
const DEFAULT_CACHE_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CACHE_CONNECT_TIMEOUT_SECS: u64 = 3;
const DEFAULT_CACHE_OPERATION_TIMEOUT_MILLIS: u64 = 500;

/// Command-line arguments for the Bazaar binary.
#[derive(Debug, Parser)]
#[command(name = "bazaar", version, about = "Bazaar catalog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BAZAAR_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the catalog HTTP service.
    Serve(Box<ServeArgs>),
    /// Warm the query cache from the database and exit.
    Warm(WarmArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct WarmArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub cache: CacheOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CacheOverrides {
    /// Override the cache backend (`redis` or `memory`).
    #[arg(long = "cache-backend", value_name = "KIND")]
    pub cache_backend: Option<String>,

    /// Override the cache server host.
    #[arg(long = "cache-host", value_name = "HOST")]
    pub cache_host: Option<String>,

    /// Override the cache server port.
    #[arg(long = "cache-port", value_name = "PORT")]
    pub cache_port: Option<u16>,

    /// Override the lifetime of cached entries, in minutes.
    #[arg(long = "cache-ttl-minutes", value_name = "MINUTES")]
    pub cache_ttl_minutes: Option<u64>,

    /// Override how long shutdown waits for in-flight cache operations.
    #[arg(long = "cache-shutdown-timeout-seconds", value_name = "SECONDS")]
    pub cache_shutdown_timeout_seconds: Option<u64>,

    /// Override how long start-up waits for the cache to answer.
    #[arg(long = "cache-connect-timeout-seconds", value_name = "SECONDS")]
    pub cache_connect_timeout_seconds: Option<u64>,

    /// Override how long a single cache command may take before it counts as a miss.
    #[arg(long = "cache-operation-timeout-millis", value_name = "MILLIS")]
    pub cache_operation_timeout_millis: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub cache: CacheOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout, in seconds.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the log level (e.g. info, debug).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the maximum number of database connections.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: BackendKind,
    pub host: String,
    pub port: u16,
    pub ttl_minutes: NonZeroU32,
    pub shutdown_timeout_seconds: NonZeroU32,
    pub connect_timeout_seconds: NonZeroU32,
    pub operation_timeout_millis: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Warm(args)) => {
            raw.apply_database_override(&args.database);
            raw.apply_cache_overrides(&args.cache);
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }

        self.apply_cache_overrides(&overrides.cache);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }

    fn apply_cache_overrides(&mut self, overrides: &CacheOverrides) {
        if let Some(backend) = overrides.cache_backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
        if let Some(host) = overrides.cache_host.as_ref() {
            self.cache.host = Some(host.clone());
        }
        if let Some(port) = overrides.cache_port {
            self.cache.port = Some(port);
        }
        if let Some(minutes) = overrides.cache_ttl_minutes {
            self.cache.ttl_minutes = Some(minutes);
        }
        if let Some(seconds) = overrides.cache_shutdown_timeout_seconds {
            self.cache.shutdown_timeout_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_connect_timeout_seconds {
            self.cache.connect_timeout_seconds = Some(seconds);
        }
        if let Some(millis) = overrides.cache_operation_timeout_millis {
            self.cache.operation_timeout_millis = Some(millis);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match cache.backend.as_deref().map(str::trim) {
        None | Some("redis") => BackendKind::Redis,
        Some("memory") => BackendKind::Memory,
        Some(other) => {
            return Err(LoadError::invalid(
                "cache.backend",
                format!("unknown backend `{other}`; expected `redis` or `memory`"),
            ));
        }
    };

    let host = cache
        .host
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_CACHE_HOST.to_string());
    if host.is_empty() {
        return Err(LoadError::invalid("cache.host", "host must not be empty"));
    }

    let port = cache.port.unwrap_or(DEFAULT_CACHE_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "cache.port",
            "port must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        backend,
        host,
        port,
        ttl_minutes: non_zero_u32(
            cache.ttl_minutes.unwrap_or(DEFAULT_CACHE_TTL_MINUTES),
            "cache.ttl_minutes",
        )?,
        shutdown_timeout_seconds: non_zero_u32(
            cache
                .shutdown_timeout_seconds
                .unwrap_or(DEFAULT_CACHE_SHUTDOWN_TIMEOUT_SECS),
            "cache.shutdown_timeout_seconds",
        )?,
        connect_timeout_seconds: non_zero_u32(
            cache
                .connect_timeout_seconds
                .unwrap_or(DEFAULT_CACHE_CONNECT_TIMEOUT_SECS),
            "cache.connect_timeout_seconds",
        )?,
        operation_timeout_millis: non_zero_u32(
            cache
                .operation_timeout_millis
                .unwrap_or(DEFAULT_CACHE_OPERATION_TIMEOUT_MILLIS),
            "cache.operation_timeout_millis",
        )?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    ttl_minutes: Option<u64>,
    shutdown_timeout_seconds: Option<u64>,
    connect_timeout_seconds: Option<u64>,
    operation_timeout_millis: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
