pub mod api;
mod health;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use health::health;

use axum::{Router, middleware as axum_middleware, routing::get};

use middleware::{log_responses, set_request_context};

/// The full HTTP surface: catalog API plus `/health`.
pub fn build_router(state: ApiState) -> Router {
    build_api_router()
        .route("/health", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
