use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;

use super::api::ApiState;

const SOURCE: &str = "infra::http::health";

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    database: &'static str,
    cache: &'static str,
    cache_backend: &'static str,
}

fn probe_label<E>(result: &Result<(), E>) -> &'static str {
    if result.is_ok() { "ok" } else { "unavailable" }
}

/// Ping the database and the cache backend.
pub async fn health(State(state): State<ApiState>) -> Response {
    let (database, cache) = tokio::join!(state.db.health_check(), state.cache.ping());

    let body = HealthBody {
        status: if database.is_ok() && cache.is_ok() {
            "ok"
        } else {
            "degraded"
        },
        database: probe_label(&database),
        cache: probe_label(&cache),
        cache_backend: state.cache.name(),
    };

    let mut failures = Vec::new();
    if let Err(err) = database {
        failures.push(format!("database: {err}"));
    }
    if let Err(err) = cache {
        failures.push(format!("cache: {err}"));
    }

    if failures.is_empty() {
        return (StatusCode::OK, Json(body)).into_response();
    }

    let mut response = (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    ErrorReport {
        source: SOURCE,
        status: StatusCode::SERVICE_UNAVAILABLE,
        messages: failures,
    }
    .attach(&mut response);
    response
}
