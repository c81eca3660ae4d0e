#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use bazaar::application::admin::CatalogAdminService;
use bazaar::application::catalog::CatalogService;
use bazaar::application::repos::{
    CatalogRepo, CatalogWriteRepo, CreateCategoryParams, CreateItemParams, ItemUpdate, RepoError,
    UpdateCategoryParams, UpdateItemParams,
};
use bazaar::cache::{CacheBackend, CacheError, CacheOrchestrator, CacheStores, MemoryBackend};
use bazaar::domain::entities::{Category, Item};
use bazaar::domain::types::SortOption;

#[derive(Default)]
struct CatalogRows {
    categories: HashMap<Uuid, Category>,
    items: HashMap<Uuid, StoredItem>,
    /// A competing move committed just before the next `update_item` takes its lock.
    competing_move: Option<(Uuid, Uuid)>,
}

#[derive(Clone)]
struct StoredItem {
    id: Uuid,
    title: String,
    description: String,
    price: i64,
    category_id: Uuid,
    vendor: String,
    images: Vec<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

/// In-memory catalog with the same ordering and matching rules as the Postgres adapter.
#[derive(Default)]
pub struct InMemoryCatalog {
    rows: Mutex<CatalogRows>,
    reads: AtomicUsize,
    fail_reads: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of read queries served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub async fn seed_category(&self, name: &str) -> Category {
        self.create_category(CreateCategoryParams {
            name: name.to_string(),
            description: format!("{name} goods"),
            image: None,
        })
        .await
        .expect("seed category")
    }

    pub async fn seed_item(&self, title: &str, price: i64, category: &Category) -> Item {
        self.create_item(CreateItemParams {
            title: title.to_string(),
            description: format!("A {title}"),
            price,
            category_id: category.id,
            vendor: "Acme".to_string(),
            images: Vec::new(),
        })
        .await
        .expect("seed item")
    }

    /// Have another writer move `item` into `to` right before the next item update lands.
    pub async fn move_before_next_update(&self, item: Uuid, to: Uuid) {
        self.rows.lock().await.competing_move = Some((item, to));
    }

    fn read(&self) -> Result<(), RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }
}

impl CatalogRows {
    fn hydrate(&self, stored: &StoredItem) -> Result<Item, RepoError> {
        let category = self
            .categories
            .get(&stored.category_id)
            .ok_or_else(|| RepoError::Integrity {
                message: "item references a missing category".to_string(),
            })?;
        Ok(Item {
            id: stored.id,
            title: stored.title.clone(),
            description: stored.description.clone(),
            price: stored.price,
            category: category.as_item_category(),
            vendor: stored.vendor.clone(),
            images: stored.images.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    fn items_where(&self, keep: impl Fn(&Item) -> bool) -> Result<Vec<Item>, RepoError> {
        let mut items = Vec::new();
        for stored in self.items.values() {
            let item = self.hydrate(stored)?;
            if keep(&item) {
                items.push(item);
            }
        }
        Ok(items)
    }

    fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.values().find(|category| category.name == name)
    }

    fn ensure_unique_name(&self, name: &str, except: Option<Uuid>) -> Result<(), RepoError> {
        match self.category_by_name(name) {
            Some(existing) if Some(existing.id) != except => Err(RepoError::Duplicate {
                constraint: "categories_name_key".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn sort_items(items: &mut [Item], sort: SortOption) {
    match sort {
        SortOption::NameAsc => items.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id))),
        SortOption::NameDesc => items.sort_by(|a, b| b.title.cmp(&a.title).then(a.id.cmp(&b.id))),
        SortOption::PriceAsc => items.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
        SortOption::PriceDesc => items.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
    }
}

fn window(items: Vec<Item>, offset: u32, limit: u32) -> Vec<Item> {
    items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl CatalogRepo for InMemoryCatalog {
    async fn list_items(
        &self,
        sort: SortOption,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError> {
        self.read()?;
        let rows = self.rows.lock().await;
        let mut items = rows.items_where(|_| true)?;
        sort_items(&mut items, sort);
        Ok(window(items, offset, limit))
    }

    async fn list_items_by_category(
        &self,
        category: &str,
        sort: SortOption,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError> {
        self.read()?;
        let rows = self.rows.lock().await;
        let mut items = rows.items_where(|item| item.category.name == category)?;
        sort_items(&mut items, sort);
        Ok(window(items, offset, limit))
    }

    async fn search_items(
        &self,
        term: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Item>, RepoError> {
        self.read()?;
        let needle = term.to_lowercase();
        let rows = self.rows.lock().await;
        let mut items = rows.items_where(|item| {
            item.title.to_lowercase().contains(&needle)
                || item.description.to_lowercase().contains(&needle)
                || item.vendor.to_lowercase().contains(&needle)
        })?;
        sort_items(&mut items, SortOption::NameAsc);
        Ok(window(items, offset, limit))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        self.read()?;
        let rows = self.rows.lock().await;
        let mut categories: Vec<Category> = rows.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn count_items(&self) -> Result<u64, RepoError> {
        self.read()?;
        Ok(self.rows.lock().await.items.len() as u64)
    }

    async fn count_items_by_category(&self, category: &str) -> Result<u64, RepoError> {
        self.read()?;
        let rows = self.rows.lock().await;
        let Some(category) = rows.category_by_name(category) else {
            return Ok(0);
        };
        let count = rows
            .items
            .values()
            .filter(|item| item.category_id == category.id)
            .count();
        Ok(count as u64)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, RepoError> {
        let rows = self.rows.lock().await;
        rows.items
            .get(&id)
            .map(|stored| rows.hydrate(stored))
            .transpose()
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.rows.lock().await.categories.get(&id).cloned())
    }
}

#[async_trait]
impl CatalogWriteRepo for InMemoryCatalog {
    async fn create_item(&self, params: CreateItemParams) -> Result<Item, RepoError> {
        let mut rows = self.rows.lock().await;
        if !rows.categories.contains_key(&params.category_id) {
            return Err(RepoError::Integrity {
                message: "category does not exist".to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let stored = StoredItem {
            id: Uuid::new_v4(),
            title: params.title,
            description: params.description,
            price: params.price,
            category_id: params.category_id,
            vendor: params.vendor,
            images: params.images,
            created_at: now,
            updated_at: now,
        };
        let item = rows.hydrate(&stored)?;
        rows.items.insert(stored.id, stored);
        Ok(item)
    }

    async fn update_item(&self, params: UpdateItemParams) -> Result<ItemUpdate, RepoError> {
        let mut rows = self.rows.lock().await;
        if !rows.categories.contains_key(&params.category_id) {
            return Err(RepoError::Integrity {
                message: "category does not exist".to_string(),
            });
        }
        if let Some((item, to)) = rows.competing_move.take() {
            if let Some(stored) = rows.items.get_mut(&item) {
                stored.category_id = to;
            }
        }
        let stored = rows.items.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        let previous_category_id = stored.category_id;
        stored.title = params.title;
        stored.description = params.description;
        stored.price = params.price;
        stored.category_id = params.category_id;
        stored.vendor = params.vendor;
        stored.images = params.images;
        stored.updated_at = OffsetDateTime::now_utc();
        let stored = stored.clone();
        let previous_category = rows
            .categories
            .get(&previous_category_id)
            .map(Category::as_item_category)
            .ok_or_else(|| RepoError::Integrity {
                message: "item references a missing category".to_string(),
            })?;
        Ok(ItemUpdate {
            item: rows.hydrate(&stored)?,
            previous_category,
        })
    }

    async fn delete_item(&self, id: Uuid) -> Result<Item, RepoError> {
        let mut rows = self.rows.lock().await;
        let stored = rows.items.remove(&id).ok_or(RepoError::NotFound)?;
        rows.hydrate(&stored)
    }

    async fn create_category(&self, params: CreateCategoryParams) -> Result<Category, RepoError> {
        let mut rows = self.rows.lock().await;
        rows.ensure_unique_name(&params.name, None)?;
        let now = OffsetDateTime::now_utc();
        let category = Category {
            id: Uuid::new_v4(),
            name: params.name,
            description: params.description,
            image: params.image,
            created_at: now,
            updated_at: now,
        };
        rows.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, params: UpdateCategoryParams) -> Result<Category, RepoError> {
        let mut rows = self.rows.lock().await;
        rows.ensure_unique_name(&params.name, Some(params.id))?;
        let category = rows
            .categories
            .get_mut(&params.id)
            .ok_or(RepoError::NotFound)?;
        category.name = params.name;
        category.description = params.description;
        category.image = params.image;
        category.updated_at = OffsetDateTime::now_utc();
        Ok(category.clone())
    }

    async fn get_or_create_category_by_name(&self, name: &str) -> Result<Category, RepoError> {
        if let Some(existing) = self.rows.lock().await.category_by_name(name) {
            return Ok(existing.clone());
        }
        self.create_category(CreateCategoryParams {
            name: name.to_string(),
            description: String::new(),
            image: None,
        })
        .await
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
        let mut rows = self.rows.lock().await;
        if !rows.categories.contains_key(&to_category_id) {
            return Err(RepoError::NotFound);
        }
        rows.categories.remove(&id).ok_or(RepoError::NotFound)?;
        let mut moved = 0;
        for item in rows.items.values_mut() {
            if item.category_id == id {
                item.category_id = to_category_id;
                moved += 1;
            }
        }
        Ok(moved)
    }
}

/// A backend whose every operation fails, standing in for an unreachable Redis.
#[derive(Default)]
pub struct FailingBackend {
    pub attempts: AtomicUsize,
}

impl FailingBackend {
    fn fail(&self) -> CacheError {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        CacheError::connection("redis://unreachable:6379/", "connection refused")
    }
}

#[async_trait]
impl CacheBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn default_ttl(&self) -> Duration {
        Duration::from_secs(600)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(self.fail())
    }

    async fn exists(&self, _key: &str) -> bool {
        self.fail();
        false
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(self.fail())
    }

    async fn set(&self, _key: &str, _payload: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(self.fail())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(self.fail())
    }

    async fn shutdown(&self, _timeout: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Services wired over one catalog and one backend, the way the binary wires them.
pub struct Harness {
    pub repo: Arc<InMemoryCatalog>,
    pub backend: Arc<dyn CacheBackend>,
    pub stores: CacheStores,
    pub orchestrator: CacheOrchestrator,
    pub catalog: CatalogService,
    pub admin: CatalogAdminService,
}

impl Harness {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        let repo = InMemoryCatalog::new();
        let reader: Arc<dyn CatalogRepo> = repo.clone();
        let writer: Arc<dyn CatalogWriteRepo> = repo.clone();

        let stores = CacheStores::new(backend.clone());
        let orchestrator = CacheOrchestrator::new(stores.clone(), reader.clone());
        let catalog = CatalogService::new(reader.clone(), stores.clone());
        let admin = CatalogAdminService::new(reader, writer, orchestrator.clone());

        Self {
            repo,
            backend,
            stores,
            orchestrator,
            catalog,
            admin,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new(Duration::from_secs(600))))
    }
}
