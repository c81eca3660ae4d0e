//! Catalog mutations as seen by the cache.

use crate::domain::entities::{Category, Item};
use crate::domain::types::{CategoryChange, ItemChange};

/// A committed mutation, reduced to the names the cache keys depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    ItemCreated {
        category: String,
    },
    ItemUpdated {
        category: String,
        previous_category: String,
    },
    ItemDeleted {
        category: String,
    },
    CategoryCreated {
        name: String,
    },
    CategoryUpdated {
        name: String,
        previous_name: String,
    },
    CategoryDeleted {
        name: String,
        reassigned_to: String,
    },
}

impl CatalogEvent {
    pub fn for_item(item: &Item, change: ItemChange) -> Self {
        let category = item.category.name.clone();
        match change {
            ItemChange::Created => CatalogEvent::ItemCreated { category },
            ItemChange::Updated { previous_category } => CatalogEvent::ItemUpdated {
                category,
                previous_category,
            },
            ItemChange::Deleted => CatalogEvent::ItemDeleted { category },
        }
    }

    pub fn for_category(category: &Category, change: CategoryChange) -> Self {
        let name = category.name.clone();
        match change {
            CategoryChange::Created => CatalogEvent::CategoryCreated { name },
            CategoryChange::Updated { previous_name } => {
                CatalogEvent::CategoryUpdated { name, previous_name }
            }
            CategoryChange::Deleted { reassigned_to } => {
                CatalogEvent::CategoryDeleted { name, reassigned_to }
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CatalogEvent::ItemCreated { .. } => "item_created",
            CatalogEvent::ItemUpdated { .. } => "item_updated",
            CatalogEvent::ItemDeleted { .. } => "item_deleted",
            CatalogEvent::CategoryCreated { .. } => "category_created",
            CatalogEvent::CategoryUpdated { .. } => "category_updated",
            CatalogEvent::CategoryDeleted { .. } => "category_deleted",
        }
    }
}
