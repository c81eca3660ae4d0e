pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, put},
};

/// Catalog routes under `/api/v1`. `{category}` is an id for writes and a name for reads.
pub fn build_api_router() -> Router<ApiState> {
    Router::new()
        .route(
            "/api/v1/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/api/v1/items/search", get(handlers::search_items))
        .route("/api/v1/items/quantity", get(handlers::items_quantity))
        .route(
            "/api/v1/items/{id}",
            put(handlers::update_item).delete(handlers::delete_item),
        )
        .route(
            "/api/v1/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/v1/categories/{category}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route(
            "/api/v1/categories/{category}/items",
            get(handlers::category_items),
        )
        .route(
            "/api/v1/categories/{category}/quantity",
            get(handlers::category_quantity),
        )
}
