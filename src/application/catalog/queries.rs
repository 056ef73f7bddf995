use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tracing::warn;

use crate::application::repos::{ProductListFilter, RepoError};
use crate::cache::{CacheKey, CacheStatus, CachedListing, ResourceFamily};
use crate::domain::catalog::ProductRecord;
use crate::domain::error::DomainError;
use crate::domain::ids::RecordId;

use super::service::CatalogReadService;
use super::types::{BannerView, CatalogError, CategoryView, Listing, ProductView};

const METRIC_CATALOG_DEGRADED: &str = "quickcart_catalog_degraded_total";

impl CatalogReadService {
    pub async fn list_categories(&self) -> Listing<CategoryView> {
        let repo = self.stores.categories.clone();
        self.read_through(CacheKey::CategoriesAll, || async move {
            repo.list_active_categories()
                .await
                .map(|rows| rows.into_iter().map(CategoryView::from).collect::<Vec<_>>())
        })
        .await
    }

    /// Whole-catalog and featured listings are cached; anything filtered by
    /// category or search text goes to the store every time.
    pub async fn list_products(&self, filter: ProductListFilter) -> Listing<ProductView> {
        let repo = self.stores.products.clone();

        if filter.is_ad_hoc() {
            let max_age = self.cache.ttl_for(ResourceFamily::Products);
            let fetched = self
                .fetch("products:filtered", async move {
                    repo.list_active_products(&filter)
                        .await
                        .map(|rows| rows.into_iter().map(ProductView::from).collect::<Vec<_>>())
                })
                .await;
            return match fetched {
                Ok(items) => Listing::fresh(Arc::new(items), CacheStatus::Bypass, max_age),
                Err(_) => Listing::degraded(CacheStatus::Bypass, self.cache.degraded_max_age()),
            };
        }

        let key = if filter.featured_only {
            CacheKey::ProductsFeatured
        } else {
            CacheKey::ProductsAll
        };
        self.read_through(key, || async move {
            repo.list_active_products(&filter)
                .await
                .map(|rows| rows.into_iter().map(ProductView::from).collect::<Vec<_>>())
        })
        .await
    }

    pub async fn list_banners(&self) -> Listing<BannerView> {
        let repo = self.stores.banners.clone();
        self.read_through(CacheKey::BannersAll, || async move {
            repo.list_active_banners()
                .await
                .map(|rows| rows.into_iter().map(BannerView::from).collect::<Vec<_>>())
        })
        .await
    }

    /// Single product lookup. Never cached; store failures surface as errors.
    pub async fn find_product(&self, id: &str) -> Result<ProductRecord, CatalogError> {
        let id = RecordId::parse(id).map_err(|err| DomainError::invalid_id("id", &err))?;
        let repo = self.stores.products.clone();
        let found = self
            .fetch("products:by_id", async move { repo.find_product(id).await })
            .await?;
        found.ok_or_else(|| CatalogError::Domain(DomainError::not_found("product", id)))
    }

    async fn read_through<T, F, Fut>(&self, key: CacheKey, load: F) -> Listing<T>
    where
        T: CachedListing,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, RepoError>>,
    {
        let ttl = self.cache.ttl_for(key.family());
        if let Some(items) = self.cache.get::<T>(key) {
            return Listing::fresh(items, CacheStatus::Hit, ttl);
        }

        match self.fetch(key.as_str(), load()).await {
            Ok(items) => {
                let items = Arc::new(items);
                self.cache.put(key, items.clone());
                Listing::fresh(items, CacheStatus::Miss, ttl)
            }
            Err(_) => Listing::degraded(CacheStatus::Miss, self.cache.degraded_max_age()),
        }
    }

    /// Run a store query under the configured time limit.
    async fn fetch<T, Fut>(&self, scope: &'static str, query: Fut) -> Result<T, RepoError>
    where
        Fut: Future<Output = Result<T, RepoError>>,
    {
        let result = match tokio::time::timeout(self.query_time_limit, query).await {
            Ok(result) => result,
            Err(_) => Err(RepoError::Timeout),
        };

        if let Err(err) = &result {
            counter!(METRIC_CATALOG_DEGRADED, "scope" => scope).increment(1);
            warn!(
                target = "quickcart::application::catalog",
                scope,
                time_limit_ms = self.query_time_limit.as_millis() as u64,
                error = %err,
                "Catalog query failed"
            );
        }
        result
    }
}
