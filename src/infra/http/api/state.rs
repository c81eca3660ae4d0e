use std::sync::Arc;

use crate::application::admin::CatalogAdminService;
use crate::application::catalog::CatalogService;
use crate::cache::CacheBackend;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
    pub admin: Arc<CatalogAdminService>,
    pub db: Arc<PostgresRepositories>,
    pub cache: Arc<dyn CacheBackend>,
}
