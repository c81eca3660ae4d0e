use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::admin::{
    CreateCategoryCommand, CreateItemCommand, UpdateCategoryCommand, UpdateItemCommand,
};
use crate::application::pagination::PageRequest;
use crate::domain::entities::Item;
use crate::domain::types::SortOption;

#[derive(Debug, Deserialize, Serialize)]
pub struct ItemRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub category_id: Uuid,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ItemRequest {
    pub fn into_create(self) -> CreateItemCommand {
        CreateItemCommand {
            title: self.title,
            description: self.description,
            price: self.price,
            category_id: self.category_id,
            vendor: self.vendor,
            images: self.images,
        }
    }

    pub fn into_update(self, id: Uuid) -> UpdateItemCommand {
        UpdateItemCommand {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            category_id: self.category_id,
            vendor: self.vendor,
            images: self.images,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
}

impl CategoryRequest {
    pub fn into_create(self) -> CreateCategoryCommand {
        CreateCategoryCommand {
            name: self.name,
            description: self.description,
            image: self.image,
        }
    }

    pub fn into_update(self, id: Uuid) -> UpdateCategoryCommand {
        UpdateCategoryCommand {
            id,
            name: self.name,
            description: self.description,
            image: self.image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemsPage {
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOption>,
    pub offset: u32,
    pub limit: u32,
}

impl ItemsPage {
    pub fn new(items: Vec<Item>, sort: Option<SortOption>, page: PageRequest) -> Self {
        Self {
            items,
            sort,
            offset: page.offset,
            limit: page.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity: u64,
}
