//! Item handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{ItemListQuery, SearchQuery, catalog_to_api};
use crate::application::pagination::PageRequest;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_items(
    State(state): State<ApiState>,
    Query(query): Query<ItemListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (sort, page) = query.resolve()?;
    let items = state
        .catalog
        .items_list(sort, page)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(ItemsPage::new(items, Some(sort), page)))
}

pub async fn search_items(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.q.unwrap_or_default();
    let page = PageRequest::from_query(query.offset, query.limit);
    let items = state
        .catalog
        .search_items(&term, page)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(ItemsPage::new(items, None, page)))
}

pub async fn items_quantity(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let quantity = state
        .catalog
        .items_quantity()
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(QuantityResponse {
        category: None,
        quantity,
    }))
}

pub async fn create_item(
    State(state): State<ApiState>,
    Json(payload): Json<ItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .admin
        .create_item(payload.into_create())
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .admin
        .update_item(payload.into_update(id))
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.admin.delete_item(id).await.map_err(catalog_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
