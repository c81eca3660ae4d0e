use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::ItemUpdate;
use crate::domain::entities::{Category, Item, ItemCategory};

#[derive(sqlx::FromRow)]
pub(super) struct ItemRow {
    id: Uuid,
    title: String,
    description: String,
    price: i64,
    vendor: String,
    images: Vec<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    category_id: Uuid,
    category_name: String,
    category_description: String,
    category_image: Option<String>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            category: ItemCategory {
                id: row.category_id,
                name: row.category_name,
                description: row.category_description,
                image: row.category_image,
            },
            vendor: row.vendor,
            images: row.images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ItemUpdateRow {
    #[sqlx(flatten)]
    item: ItemRow,
    previous_category_id: Uuid,
    previous_category_name: String,
    previous_category_description: String,
    previous_category_image: Option<String>,
}

impl From<ItemUpdateRow> for ItemUpdate {
    fn from(row: ItemUpdateRow) -> Self {
        Self {
            previous_category: ItemCategory {
                id: row.previous_category_id,
                name: row.previous_category_name,
                description: row.previous_category_description,
                image: row.previous_category_image,
            },
            item: Item::from(row.item),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CategoryRow {
    id: Uuid,
    name: String,
    description: String,
    image: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
