//! API handlers organized by resource type.
//!
//! Query structs and error conversions shared by both resources live here.

mod categories;
mod items;

pub use categories::*;
pub use items::*;

// ----- Shared query structs -----

use serde::Deserialize;

use crate::application::pagination::PageRequest;
use crate::domain::types::SortOption;

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    pub sort: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl ItemListQuery {
    fn resolve(&self) -> Result<(SortOption, PageRequest), ApiError> {
        let sort = match self.sort.as_deref() {
            None | Some("") => SortOption::default(),
            Some(raw) => raw.parse::<SortOption>().map_err(|err| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    codes::INVALID_SORT,
                    "Unknown sort option",
                    Some(err.to_string()),
                )
            })?,
        };
        Ok((sort, PageRequest::from_query(self.offset, self.limit)))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

// ----- Shared error conversions -----

use axum::http::StatusCode;

use crate::application::catalog::CatalogError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found", None),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn catalog_to_api(err: CatalogError) -> ApiError {
    match err {
        CatalogError::Domain(DomainError::NotFound { entity }) => {
            ApiError::not_found("Resource not found", Some(format!("{entity} not found")))
        }
        CatalogError::Domain(err @ DomainError::Validation { .. }) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(err.to_string()),
        ),
        CatalogError::Domain(err @ DomainError::ReservedCategory { .. }) => ApiError::new(
            StatusCode::CONFLICT,
            codes::RESERVED_CATEGORY,
            "Category is reserved",
            Some(err.to_string()),
        ),
        CatalogError::Repo(repo) => repo_to_api(repo),
    }
}
