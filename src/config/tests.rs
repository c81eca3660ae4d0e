use super::*;
use crate::cache::CacheConfig;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.ttl_minutes = Some(30);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache: CacheOverrides {
            cache_ttl_minutes: Some(2),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.ttl_minutes.get(), 2);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["bazaar"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "bazaar",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-host",
        "redis.internal",
        "--cache-port",
        "6380",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(
                serve.overrides.cache.cache_host.as_deref(),
                Some("redis.internal")
            );
            assert_eq!(serve.overrides.cache.cache_port, Some(6380));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_warm_arguments() {
    let args = CliArgs::parse_from([
        "bazaar",
        "warm",
        "--database-url",
        "postgres://example",
        "--cache-backend",
        "memory",
    ]);

    match args.command.expect("warm command") {
        Command::Warm(warm) => {
            assert_eq!(
                warm.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(warm.cache.cache_backend.as_deref(), Some("memory"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn cache_settings_use_correct_defaults() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.cache.backend, BackendKind::Redis);
    assert_eq!(settings.cache.host, "127.0.0.1");
    assert_eq!(settings.cache.port, 6379);
    assert_eq!(settings.cache.ttl_minutes.get(), 10);
    assert_eq!(settings.cache.shutdown_timeout_seconds.get(), 5);
    assert_eq!(settings.cache.connect_timeout_seconds.get(), 3);
    assert_eq!(settings.cache.operation_timeout_millis.get(), 500);

    let config = CacheConfig::from(&settings.cache);
    assert_eq!(config.ttl, Duration::from_secs(600));
    assert_eq!(config.endpoint(), "redis://127.0.0.1:6379/");
    assert_eq!(config.operation_timeout, Duration::from_millis(500));
}

#[test]
fn unknown_cache_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcached".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown backend");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.backend",
            ..
        }
    ));
}

#[test]
fn zero_cache_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_minutes = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero ttl");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.ttl_minutes",
            ..
        }
    ));
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}
