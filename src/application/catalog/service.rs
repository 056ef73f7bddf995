use std::sync::Arc;
use std::time::Duration;

use crate::application::admin::audit::AdminAuditService;
use crate::application::repos::{
    BannersRepo, BannersWriteRepo, CategoriesRepo, CategoriesWriteRepo, ProductsRepo,
    ProductsWriteRepo,
};
use crate::cache::CatalogCache;

/// Read and write handles on the three catalog collections.
#[derive(Clone)]
pub struct CatalogStores {
    pub categories: Arc<dyn CategoriesRepo>,
    pub categories_write: Arc<dyn CategoriesWriteRepo>,
    pub products: Arc<dyn ProductsRepo>,
    pub products_write: Arc<dyn ProductsWriteRepo>,
    pub banners: Arc<dyn BannersRepo>,
    pub banners_write: Arc<dyn BannersWriteRepo>,
}

impl CatalogStores {
    /// Use one adapter for every collection.
    pub fn from_adapter<R>(repos: Arc<R>) -> Self
    where
        R: CategoriesRepo
            + CategoriesWriteRepo
            + ProductsRepo
            + ProductsWriteRepo
            + BannersRepo
            + BannersWriteRepo
            + 'static,
    {
        Self {
            categories: repos.clone(),
            categories_write: repos.clone(),
            products: repos.clone(),
            products_write: repos.clone(),
            banners: repos.clone(),
            banners_write: repos,
        }
    }
}

/// Storefront listings, served read-through from the catalog cache.
#[derive(Clone)]
pub struct CatalogReadService {
    pub(crate) stores: CatalogStores,
    pub(crate) cache: Arc<CatalogCache>,
    pub(crate) query_time_limit: Duration,
}

impl CatalogReadService {
    pub fn new(stores: CatalogStores, cache: Arc<CatalogCache>, query_time_limit: Duration) -> Self {
        Self {
            stores,
            cache,
            query_time_limit,
        }
    }
}

/// Admin mutations. Each confirmed write evicts its family, then audits.
#[derive(Clone)]
pub struct AdminCatalogService {
    pub(crate) stores: CatalogStores,
    pub(crate) cache: Arc<CatalogCache>,
    pub(crate) audit: AdminAuditService,
}

impl AdminCatalogService {
    pub fn new(stores: CatalogStores, cache: Arc<CatalogCache>, audit: AdminAuditService) -> Self {
        Self {
            stores,
            cache,
            audit,
        }
    }
}
