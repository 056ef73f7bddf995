//! HTTP surface: storefront listings, admin catalog management, inventory
//! snapshots and saved addresses.

mod addresses;
mod admin;
pub mod error;
mod middleware;
mod public;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware as axum_middleware};

use crate::application::addresses::AddressService;
use crate::application::admin::{AdminAuditService, InventorySnapshotService};
use crate::application::catalog::{AdminCatalogService, CatalogReadService, CatalogStores};
use crate::application::repos::{
    AddressesRepo, AuditRepo, BannersRepo, BannersWriteRepo, CategoriesRepo, CategoriesWriteRepo,
    HealthRepo, ProductsRepo, ProductsWriteRepo, SnapshotsRepo,
};
use crate::cache::{CacheConfig, CatalogCache};

use middleware::{log_responses, set_request_context};

/// Actor recorded in audit entries for admin routes.
pub const ADMIN_ACTOR: &str = "admin";

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogReadService,
    pub admin: AdminCatalogService,
    pub snapshots: InventorySnapshotService,
    pub addresses: AddressService,
    pub audit: AdminAuditService,
    pub cache: Arc<CatalogCache>,
    pub health: Arc<dyn HealthRepo>,
}

impl AppState {
    /// Wire every service on top of one repository adapter.
    pub fn from_repositories<R>(
        repos: Arc<R>,
        cache: CacheConfig,
        query_time_limit: Duration,
    ) -> Self
    where
        R: CategoriesRepo
            + CategoriesWriteRepo
            + ProductsRepo
            + ProductsWriteRepo
            + BannersRepo
            + BannersWriteRepo
            + SnapshotsRepo
            + AuditRepo
            + AddressesRepo
            + HealthRepo
            + 'static,
    {
        let cache = Arc::new(CatalogCache::new(cache));
        let stores = CatalogStores::from_adapter(repos.clone());
        let audit = AdminAuditService::new(repos.clone());

        Self {
            catalog: CatalogReadService::new(stores.clone(), cache.clone(), query_time_limit),
            admin: AdminCatalogService::new(stores.clone(), cache.clone(), audit.clone()),
            snapshots: InventorySnapshotService::new(
                repos.clone(),
                stores,
                cache.clone(),
                audit.clone(),
            ),
            addresses: AddressService::new(repos.clone()),
            audit,
            cache,
            health: repos,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    public::routes()
        .merge(admin::routes())
        .merge(addresses::routes())
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
