//! Catalog write use cases. Each one commits first, then keeps the cache coherent.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::catalog::CatalogError;
use crate::application::repos::{
    CatalogRepo, CatalogWriteRepo, CreateCategoryParams, CreateItemParams, ItemUpdate, RepoError,
    UpdateCategoryParams, UpdateItemParams,
};
use crate::cache::CacheOrchestrator;
use crate::domain::entities::{Category, Item};
use crate::domain::error::DomainError;
use crate::domain::rules;
use crate::domain::types::{CategoryChange, ItemChange, SENTINEL_CATEGORY_NAME};

const SOURCE: &str = "application::admin";

#[derive(Debug, Clone)]
pub struct CreateItemCommand {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category_id: Uuid,
    pub vendor: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateItemCommand {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category_id: Uuid,
    pub vendor: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCategoryCommand {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryCommand {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct CatalogAdminService {
    reader: Arc<dyn CatalogRepo>,
    writer: Arc<dyn CatalogWriteRepo>,
    cache: CacheOrchestrator,
}

impl CatalogAdminService {
    pub fn new(
        reader: Arc<dyn CatalogRepo>,
        writer: Arc<dyn CatalogWriteRepo>,
        cache: CacheOrchestrator,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    pub async fn create_item(&self, command: CreateItemCommand) -> Result<Item, CatalogError> {
        let params = CreateItemParams {
            title: rules::required_text("title", &command.title)?,
            description: command.description.trim().to_string(),
            price: rules::price(command.price)?,
            category_id: command.category_id,
            vendor: command.vendor.trim().to_string(),
            images: rules::images(command.images),
        };
        self.require_category(params.category_id).await?;

        let item = self.writer.create_item(params).await?;
        info!(
            target = SOURCE,
            item_id = %item.id,
            category = %item.category.name,
            "Item created"
        );

        self.cache
            .on_item_mutated(&item, ItemChange::Created)
            .await
            .log("item.create");
        Ok(item)
    }

    pub async fn update_item(&self, command: UpdateItemCommand) -> Result<Item, CatalogError> {
        let params = UpdateItemParams {
            id: command.id,
            title: rules::required_text("title", &command.title)?,
            description: command.description.trim().to_string(),
            price: rules::price(command.price)?,
            category_id: command.category_id,
            vendor: command.vendor.trim().to_string(),
            images: rules::images(command.images),
        };
        self.require_category(params.category_id).await?;

        let ItemUpdate {
            item,
            previous_category,
        } = self
            .writer
            .update_item(params)
            .await
            .map_err(item_not_found)?;
        info!(
            target = SOURCE,
            item_id = %item.id,
            category = %item.category.name,
            previous_category = %previous_category.name,
            "Item updated"
        );

        let change = ItemChange::Updated {
            previous_category: previous_category.name,
        };
        self.cache
            .on_item_mutated(&item, change)
            .await
            .log("item.update");
        Ok(item)
    }

    pub async fn delete_item(&self, id: Uuid) -> Result<(), CatalogError> {
        let removed = self.writer.delete_item(id).await.map_err(item_not_found)?;
        info!(
            target = SOURCE,
            item_id = %id,
            category = %removed.category.name,
            "Item deleted"
        );

        self.cache
            .on_item_mutated(&removed, ItemChange::Deleted)
            .await
            .log("item.delete");
        Ok(())
    }

    pub async fn create_category(
        &self,
        command: CreateCategoryCommand,
    ) -> Result<Category, CatalogError> {
        let params = CreateCategoryParams {
            name: rules::required_text("name", &command.name)?,
            description: command.description.trim().to_string(),
            image: rules::optional_text(command.image),
        };

        let category = self.writer.create_category(params).await?;
        info!(
            target = SOURCE,
            category_id = %category.id,
            name = %category.name,
            "Category created"
        );

        self.cache
            .on_category_mutated(&category, CategoryChange::Created)
            .await
            .log("category.create");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        command: UpdateCategoryCommand,
    ) -> Result<Category, CatalogError> {
        let params = UpdateCategoryParams {
            id: command.id,
            name: rules::required_text("name", &command.name)?,
            description: command.description.trim().to_string(),
            image: rules::optional_text(command.image),
        };
        let existing = self
            .reader
            .find_category(params.id)
            .await?
            .ok_or(DomainError::not_found("category"))?;
        if existing.name != params.name {
            rules::ensure_not_sentinel(&existing.name, "renamed")?;
        }

        let category = self.writer.update_category(params).await?;
        info!(
            target = SOURCE,
            category_id = %category.id,
            name = %category.name,
            previous_name = %existing.name,
            "Category updated"
        );

        let change = CategoryChange::Updated {
            previous_name: existing.name,
        };
        self.cache
            .on_category_mutated(&category, change)
            .await
            .log("category.update");
        Ok(category)
    }

    /// Move the category's items to the sentinel category, then delete it.
    pub async fn delete_category(&self, id: Uuid) -> Result<(), CatalogError> {
        let existing = self
            .reader
            .find_category(id)
            .await?
            .ok_or(DomainError::not_found("category"))?;
        rules::ensure_not_sentinel(&existing.name, "deleted")?;

        let sentinel = self
            .writer
            .get_or_create_category_by_name(SENTINEL_CATEGORY_NAME)
            .await?;
        let moved = self
            .writer
            .delete_category_reassigning(existing.id, sentinel.id)
            .await?;
        info!(
            target = SOURCE,
            category_id = %existing.id,
            name = %existing.name,
            moved,
            "Category deleted"
        );

        let change = CategoryChange::Deleted {
            reassigned_to: sentinel.name,
        };
        self.cache
            .on_category_mutated(&existing, change)
            .await
            .log("category.delete");
        Ok(())
    }

    async fn require_category(&self, id: Uuid) -> Result<Category, CatalogError> {
        self.reader
            .find_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("category").into())
    }
}

fn item_not_found(err: RepoError) -> CatalogError {
    match err {
        RepoError::NotFound => DomainError::not_found("item").into(),
        other => other.into(),
    }
}
