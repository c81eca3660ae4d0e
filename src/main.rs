use std::{process, sync::Arc, time::Duration};

use bazaar::{
    application::{
        admin::CatalogAdminService,
        catalog::CatalogService,
        error::AppError,
        repos::{CatalogRepo, CatalogWriteRepo},
    },
    cache::{self, CacheBackend, CacheConfig, CacheOrchestrator, CacheStores},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SOURCE: &str = "bazaar::main";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, hint = error.hint(), "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, hint = error.hint(), "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let app = build_application_context(&settings).await?;
    let shutdown_timeout = app.cache_config.shutdown_timeout;
    let backend = app.backend.clone();

    let result = match command {
        config::Command::Serve(_) => run_serve(&settings, app).await,
        config::Command::Warm(_) => run_warm(app).await,
    };

    if let Err(err) = backend.shutdown(shutdown_timeout).await {
        error!(target = SOURCE, error = %err, "Cache backend did not shut down cleanly");
    }

    result
}

struct ApplicationContext {
    api_state: ApiState,
    orchestrator: CacheOrchestrator,
    backend: Arc<dyn CacheBackend>,
    cache_config: CacheConfig,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let repositories = init_repositories(settings).await?;
    let catalog_repo: Arc<dyn CatalogRepo> = repositories.clone();
    let catalog_write_repo: Arc<dyn CatalogWriteRepo> = repositories.clone();

    let cache_config = CacheConfig::from(&settings.cache);
    let backend = cache::connect(&cache_config).await?;
    info!(
        target = SOURCE,
        backend = backend.name(),
        ttl_seconds = cache_config.ttl.as_secs(),
        "Cache backend ready"
    );

    let stores = CacheStores::new(backend.clone());
    let orchestrator = CacheOrchestrator::new(stores.clone(), catalog_repo.clone());

    let catalog = Arc::new(CatalogService::new(catalog_repo.clone(), stores));
    let admin = Arc::new(CatalogAdminService::new(
        catalog_repo,
        catalog_write_repo,
        orchestrator.clone(),
    ));

    let api_state = ApiState {
        catalog,
        admin,
        db: repositories,
        cache: backend.clone(),
    };

    Ok(ApplicationContext {
        api_state,
        orchestrator,
        backend,
        cache_config,
    })
}

async fn warm_cache(orchestrator: &CacheOrchestrator) -> Result<(), AppError> {
    let report = orchestrator.warm_up().await.map_err(AppError::Warmup)?;
    for failure in &report.failures {
        warn!(
            target = SOURCE,
            key = %failure.key,
            error = %failure.error,
            "Entry was not warmed"
        );
    }
    Ok(())
}

async fn run_warm(app: ApplicationContext) -> Result<(), AppError> {
    warm_cache(&app.orchestrator).await?;
    info!(target = SOURCE, "Cache warmed");
    Ok(())
}

async fn run_serve(settings: &config::Settings, app: ApplicationContext) -> Result<(), AppError> {
    warm_cache(&app.orchestrator).await?;

    let router = http::build_router(app.api_state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = SOURCE, addr = %settings.server.addr, "Listening");

    serve_http(listener, router, settings.server.graceful_shutdown).await
}

/// Serve until a shutdown signal arrives, then give open connections `grace` to finish.
async fn serve_http(
    listener: tokio::net::TcpListener,
    router: axum::Router,
    grace: Duration,
) -> Result<(), AppError> {
    let stopping = Arc::new(Notify::new());
    let signal = stopping.clone();

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signal.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = SOURCE,
                grace_seconds = grace.as_secs(),
                "Connections still open after the grace period; stopping anyway"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = SOURCE, error = %err, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = SOURCE, "Shutdown signal received");
}
