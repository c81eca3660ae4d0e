//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{Category, Item, ItemCategory};
use crate::domain::types::SortOption;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateItemParams {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category_id: Uuid,
    pub vendor: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateItemParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category_id: Uuid,
    pub vendor: String,
    pub images: Vec<String>,
}

/// An updated item together with the category it was in when the write took its row lock.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub item: Item,
    pub previous_category: ItemCategory,
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryParams {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

/// Read side of the relational catalog. Every listing embeds the current category of each item.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn list_items(
        &self,
        sort: SortOption,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError>;

    async fn list_items_by_category(
        &self,
        category: &str,
        sort: SortOption,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError>;

    /// Case-insensitive match on title, description and vendor, ordered by title.
    async fn search_items(
        &self,
        term: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;

    async fn count_items(&self) -> Result<u64, RepoError>;

    async fn count_items_by_category(&self, category: &str) -> Result<u64, RepoError>;

    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, RepoError>;

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, RepoError>;
}

#[async_trait]
pub trait CatalogWriteRepo: Send + Sync {
    async fn create_item(&self, params: CreateItemParams) -> Result<Item, RepoError>;

    async fn update_item(&self, params: UpdateItemParams) -> Result<ItemUpdate, RepoError>;

    /// Returns the item as it was when deleted.
    async fn delete_item(&self, id: Uuid) -> Result<Item, RepoError>;

    async fn create_category(&self, params: CreateCategoryParams) -> Result<Category, RepoError>;

    async fn update_category(&self, params: UpdateCategoryParams) -> Result<Category, RepoError>;

    async fn get_or_create_category_by_name(&self, name: &str) -> Result<Category, RepoError>;

    /// Move every item of `id` into `to_category_id`, then delete `id`, atomically.
    ///
    /// Returns the number of items moved.
    async fn delete_category_reassigning(
        &self,
        id: Uuid,
        to_category_id: Uuid,
    ) -> Result<u64, RepoError>;
}
