use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::application::repos::{CatalogRepo, RepoError};
use crate::domain::entities::{Category, Item};
use crate::domain::types::SortOption;

use super::super::PostgresRepositories;
use super::super::util::{convert_count, map_sqlx_error};
use super::types::{CategoryRow, ItemRow};
use super::{CATEGORY_SELECT, ITEM_SELECT, like_pattern, order_clause, push_window};

const ITEM_FROM: &str = " FROM items i INNER JOIN categories c ON c.id = i.category_id";

#[async_trait]
impl CatalogRepo for PostgresRepositories {
    async fn list_items(
        &self,
        sort: SortOption,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        qb.push(ITEM_FROM);
        qb.push(order_clause(sort));
        push_window(&mut qb, offset, limit);

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn list_items_by_category(
        &self,
        category: &str,
        sort: SortOption,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        qb.push(ITEM_FROM);
        qb.push(" WHERE c.name = ");
        qb.push_bind(category);
        qb.push(order_clause(sort));
        push_window(&mut qb, offset, limit);

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn search_items(
        &self,
        term: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError> {
        let pattern = like_pattern(term);
        let mut qb = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        qb.push(ITEM_FROM);
        qb.push(" WHERE i.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR i.description ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR i.vendor ILIKE ");
        qb.push_bind(pattern);
        qb.push(order_clause(SortOption::NameAsc));
        push_window(&mut qb, offset, limit);

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} ORDER BY name"))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn count_items(&self) -> Result<u64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        convert_count(count)
    }

    async fn count_items_by_category(&self, category: &str) -> Result<u64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM items i
            INNER JOIN categories c ON c.id = i.category_id
            WHERE c.name = $1
            "#,
        )
        .bind(category)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        convert_count(count)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, RepoError> {
        let sql = format!("{ITEM_SELECT}{ITEM_FROM} WHERE i.id = $1");
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Item::from))
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        let sql = format!("{CATEGORY_SELECT} WHERE id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Category::from))
    }
}
