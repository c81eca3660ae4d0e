//! Category handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{ItemListQuery, catalog_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_categories(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .catalog
        .category_list()
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<ApiState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .admin
        .create_category(payload.into_create())
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .admin
        .update_category(payload.into_update(id))
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(category))
}

/// Items of the deleted category move to `NoCategory`.
pub async fn delete_category(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .admin
        .delete_category(id)
        .await
        .map_err(catalog_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn category_items(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(query): Query<ItemListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (sort, page) = query.resolve()?;
    let items = state
        .catalog
        .items_by_category(&name, sort, page)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(ItemsPage::new(items, Some(sort), page)))
}

pub async fn category_quantity(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let quantity = state
        .catalog
        .items_quantity_by_category(&name)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(QuantityResponse {
        category: Some(name),
        quantity,
    }))
}
