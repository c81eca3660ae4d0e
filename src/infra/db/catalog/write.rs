use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CatalogWriteRepo, CreateCategoryParams, CreateItemParams, ItemUpdate, RepoError,
    UpdateCategoryParams, UpdateItemParams,
};
use crate::domain::entities::{Category, Item};

use super::super::PostgresRepositories;
use super::super::util::map_sqlx_error;
use super::types::{CategoryRow, ItemRow, ItemUpdateRow};
use super::{CATEGORY_SELECT, ITEM_SELECT};

const SOURCE: &str = "infra::db::catalog";

const CATEGORY_RETURNING: &str = " RETURNING id, name, description, image, created_at, updated_at";

#[async_trait]
impl CatalogWriteRepo for PostgresRepositories {
    async fn create_item(&self, params: CreateItemParams) -> Result<Item, RepoError> {
        let sql = format!(
            "WITH written AS ( \
                INSERT INTO items (id, title, description, price, category_id, vendor, images) \
                VALUES ($1, $2, $3, $4, $5, $6, $7) \
                RETURNING * \
            ) {ITEM_SELECT} FROM written i INNER JOIN categories c ON c.id = i.category_id"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&params.title)
            .bind(&params.description)
            .bind(params.price)
            .bind(params.category_id)
            .bind(&params.vendor)
            .bind(&params.images)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(Item::from(row))
    }

    async fn update_item(&self, params: UpdateItemParams) -> Result<ItemUpdate, RepoError> {
        // `old` locks the row, so the previous category is the one this write replaced.
        let sql = format!(
            "WITH written AS ( \
                UPDATE items \
                SET title = $2, description = $3, price = $4, category_id = $5, \
                    vendor = $6, images = $7, updated_at = now() \
                FROM (SELECT id, category_id FROM items WHERE id = $1 FOR UPDATE) old \
                WHERE items.id = old.id \
                RETURNING items.*, old.category_id AS previous_category_id \
            ) {ITEM_SELECT}, \
                p.name AS previous_category_name, \
                p.description AS previous_category_description, \
                p.image AS previous_category_image, \
                i.previous_category_id \
            FROM written i \
            INNER JOIN categories c ON c.id = i.category_id \
            INNER JOIN categories p ON p.id = i.previous_category_id"
        );
        let row = sqlx::query_as::<_, ItemUpdateRow>(&sql)
            .bind(params.id)
            .bind(&params.title)
            .bind(&params.description)
            .bind(params.price)
            .bind(params.category_id)
            .bind(&params.vendor)
            .bind(&params.images)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(ItemUpdate::from).ok_or(RepoError::NotFound)
    }

    async fn delete_item(&self, id: Uuid) -> Result<Item, RepoError> {
        let sql = format!(
            "WITH removed AS (DELETE FROM items WHERE id = $1 RETURNING *) \
             {ITEM_SELECT} FROM removed i INNER JOIN categories c ON c.id = i.category_id"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(Item::from).ok_or(RepoError::NotFound)
    }

    async fn create_category(&self, params: CreateCategoryParams) -> Result<Category, RepoError> {
        let sql = format!(
            "INSERT INTO categories (id, name, description, image) \
             VALUES ($1, $2, $3, $4){CATEGORY_RETURNING}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&params.name)
            .bind(&params.description)
            .bind(&params.image)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(Category::from(row))
    }

    async fn update_category(&self, params: UpdateCategoryParams) -> Result<Category, RepoError> {
        let sql = format!(
            "UPDATE categories \
             SET name = $2, description = $3, image = $4, updated_at = now() \
             WHERE id = $1{CATEGORY_RETURNING}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(params.id)
            .bind(&params.name)
            .bind(&params.description)
            .bind(&params.image)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(Category::from).ok_or(RepoError::NotFound)
    }

    async fn get_or_create_category_by_name(&self, name: &str) -> Result<Category, RepoError> {
        sqlx::query(
            "INSERT INTO categories (id, name, description) VALUES ($1, $2, '') \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let sql = format!("{CATEGORY_SELECT} WHERE name = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(name)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(Category::from(row))
    }

    async fn delete_category_reassigning(
        &self,
        id: Uuid,
        to_category_id: Uuid,
    ) -> Result<u64, RepoError> {
        if id == to_category_id {
            return Err(RepoError::InvalidInput {
                message: "a category cannot absorb its own items".to_string(),
            });
        }

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let moved = sqlx::query(
            "UPDATE items SET category_id = $2, updated_at = now() WHERE category_id = $1",
        )
        .bind(id)
        .bind(to_category_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        if deleted == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        info!(
            target = SOURCE,
            category_id = %id,
            to_category_id = %to_category_id,
            moved,
            "Category deleted and items reassigned"
        );
        Ok(moved)
    }
}
