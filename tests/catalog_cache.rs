use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quickcart::application::catalog::{
    CatalogReadService, CatalogStores, CreateBannerCommand, CreateCategoryCommand,
    CreateProductCommand, UpdateBannerCommand, UpdateCategoryCommand, UpdateProductCommand,
};
use quickcart::application::repos::{
    CategoriesRepo, CategorySummary, ProductListFilter, RepoError,
};
use quickcart::cache::{CacheConfig, CacheStatus, CatalogCache};
use quickcart::domain::catalog::CategoryRecord;
use quickcart::domain::ids::RecordId;
use quickcart::infra::http::{ADMIN_ACTOR, AppState};
use quickcart::infra::memory::InMemoryRepositories;

fn app(config: CacheConfig) -> (Arc<InMemoryRepositories>, AppState) {
    let repos = Arc::new(InMemoryRepositories::new());
    let state = AppState::from_repositories(repos.clone(), config, Duration::from_secs(5));
    (repos, state)
}

fn category(name: &str) -> CreateCategoryCommand {
    CreateCategoryCommand {
        name: name.to_string(),
        description: None,
        image: None,
        display_order: 0,
        priority: 0,
        is_active: true,
    }
}

fn product(name: &str, category_id: RecordId, price: f64) -> CreateProductCommand {
    CreateProductCommand {
        name: name.to_string(),
        description: None,
        category_id: category_id.to_hex(),
        price,
        original_price: None,
        unit: None,
        stock: 10,
        is_active: true,
        is_featured: false,
        images: Vec::new(),
        tags: Vec::new(),
        delivery_time: None,
    }
}

#[tokio::test]
async fn confirmed_write_is_visible_on_next_read() {
    let (_, state) = app(CacheConfig::default());
    state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");

    let first = state.catalog.list_categories().await;
    assert_eq!(first.cache, CacheStatus::Miss);
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.max_age, Duration::from_secs(300));

    let second = state.catalog.list_categories().await;
    assert_eq!(second.cache, CacheStatus::Hit);

    state
        .admin
        .create_category(ADMIN_ACTOR, category("Bakery"))
        .await
        .expect("create bakery");

    let third = state.catalog.list_categories().await;
    assert_eq!(third.cache, CacheStatus::Miss);
    assert_eq!(third.items.len(), 2);
}

#[tokio::test]
async fn product_update_refreshes_every_product_listing() {
    let (_, state) = app(CacheConfig::default());
    let dairy = state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");
    let milk = state
        .admin
        .create_product(ADMIN_ACTOR, product("Milk", dairy.id, 30.0))
        .await
        .expect("create milk");

    let featured = ProductListFilter {
        featured_only: true,
        ..Default::default()
    };
    assert!(state.catalog.list_products(featured.clone()).await.items.is_empty());
    assert_eq!(
        state.catalog.list_products(ProductListFilter::default()).await.items[0].price,
        30.0
    );

    state
        .admin
        .update_product(
            ADMIN_ACTOR,
            &milk.id.to_hex(),
            UpdateProductCommand {
                price: Some(25.0),
                original_price: Some(Some(50.0)),
                is_featured: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("update milk");

    let featured_listing = state.catalog.list_products(featured).await;
    assert_eq!(featured_listing.cache, CacheStatus::Miss);
    assert_eq!(featured_listing.items.len(), 1);
    assert_eq!(featured_listing.items[0].discount, Some(50));

    let all = state.catalog.list_products(ProductListFilter::default()).await;
    assert_eq!(all.cache, CacheStatus::Miss);
    assert_eq!(all.items[0].price, 25.0);
}

#[tokio::test]
async fn failed_write_leaves_cached_listing_alone() {
    let (_, state) = app(CacheConfig::default());
    let dairy = state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");
    state.catalog.list_categories().await;

    let result = state
        .admin
        .update_category(
            ADMIN_ACTOR,
            &dairy.id.to_hex(),
            UpdateCategoryCommand {
                name: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(result.is_err());

    assert_eq!(state.catalog.list_categories().await.cache, CacheStatus::Hit);
}

#[tokio::test]
async fn store_outage_degrades_to_empty_uncached_listing() {
    let (repos, state) = app(CacheConfig::default());
    state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");

    repos.set_unavailable(true);
    let degraded = state.catalog.list_categories().await;
    assert!(degraded.degraded);
    assert!(degraded.items.is_empty());
    assert_eq!(degraded.cache, CacheStatus::Miss);
    assert_eq!(degraded.max_age, Duration::from_secs(10));
    assert!(state.cache.is_empty());

    repos.set_unavailable(false);
    let recovered = state.catalog.list_categories().await;
    assert_eq!(recovered.cache, CacheStatus::Miss);
    assert_eq!(recovered.items.len(), 1);
}

#[tokio::test]
async fn cached_listing_survives_store_outage() {
    let (repos, state) = app(CacheConfig::default());
    state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");
    state.catalog.list_categories().await;

    repos.set_unavailable(true);
    let listing = state.catalog.list_categories().await;
    assert_eq!(listing.cache, CacheStatus::Hit);
    assert!(!listing.degraded);
    assert_eq!(listing.items.len(), 1);
}

#[tokio::test]
async fn filtered_and_searched_products_bypass_the_cache() {
    let (_, state) = app(CacheConfig::default());
    let snacks = state
        .admin
        .create_category(ADMIN_ACTOR, category("Snacks"))
        .await
        .expect("create snacks");
    let mut chips = product("Potato Chips", snacks.id, 20.0);
    chips.tags = vec!["crisps".to_string()];
    state
        .admin
        .create_product(ADMIN_ACTOR, chips)
        .await
        .expect("create chips");
    state
        .admin
        .create_product(ADMIN_ACTOR, product("Peanuts", snacks.id, 15.0))
        .await
        .expect("create peanuts");

    let by_category = state
        .catalog
        .list_products(ProductListFilter {
            category_id: Some(snacks.id),
            ..Default::default()
        })
        .await;
    assert_eq!(by_category.cache, CacheStatus::Bypass);
    assert_eq!(by_category.items.len(), 2);

    let searched = state
        .catalog
        .list_products(ProductListFilter {
            search: Some("CHIPS".to_string()),
            ..Default::default()
        })
        .await;
    assert_eq!(searched.cache, CacheStatus::Bypass);
    assert_eq!(searched.items.len(), 1);
    assert_eq!(searched.items[0].name, "Potato Chips");

    let by_tag = state
        .catalog
        .list_products(ProductListFilter {
            search: Some("crisps".to_string()),
            ..Default::default()
        })
        .await;
    assert_eq!(by_tag.items.len(), 1);

    assert!(state.cache.is_empty());
}

#[tokio::test]
async fn tag_search_ignores_case() {
    let (_, state) = app(CacheConfig::default());
    let dairy = state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");
    let mut eggs = product("Farm Eggs", dairy.id, 60.0);
    eggs.tags = vec!["Organic".to_string()];
    state
        .admin
        .create_product(ADMIN_ACTOR, eggs)
        .await
        .expect("create eggs");

    for search in ["Organic", "organic", "ORGANIC"] {
        let found = state
            .catalog
            .list_products(ProductListFilter {
                search: Some(search.to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(found.cache, CacheStatus::Bypass);
        assert_eq!(found.items.len(), 1, "search `{search}`");
        assert_eq!(found.items[0].name, "Farm Eggs");
    }
}

#[tokio::test]
async fn product_delete_refreshes_product_listings() {
    let (_, state) = app(CacheConfig::default());
    let dairy = state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");
    let milk = state
        .admin
        .create_product(ADMIN_ACTOR, product("Milk", dairy.id, 30.0))
        .await
        .expect("create milk");

    state.catalog.list_products(ProductListFilter::default()).await;
    let warm = state.catalog.list_products(ProductListFilter::default()).await;
    assert_eq!(warm.cache, CacheStatus::Hit);
    assert_eq!(warm.items.len(), 1);

    state
        .admin
        .delete_product(ADMIN_ACTOR, &milk.id.to_hex())
        .await
        .expect("delete milk");

    let after = state.catalog.list_products(ProductListFilter::default()).await;
    assert_eq!(after.cache, CacheStatus::Miss);
    assert!(after.items.is_empty());
}

#[tokio::test]
async fn banner_writes_refresh_banner_listing() {
    let (_, state) = app(CacheConfig::default());
    assert!(state.catalog.list_banners().await.items.is_empty());
    assert_eq!(state.catalog.list_banners().await.cache, CacheStatus::Hit);

    let banner = state
        .admin
        .create_banner(
            ADMIN_ACTOR,
            CreateBannerCommand {
                title: "Monsoon sale".to_string(),
                image: "monsoon.png".to_string(),
                link: None,
                display_order: 0,
                is_active: true,
            },
        )
        .await
        .expect("create banner");

    let created = state.catalog.list_banners().await;
    assert_eq!(created.cache, CacheStatus::Miss);
    assert_eq!(created.items.len(), 1);
    assert_eq!(state.catalog.list_banners().await.cache, CacheStatus::Hit);

    state
        .admin
        .update_banner(
            ADMIN_ACTOR,
            &banner.id.to_hex(),
            UpdateBannerCommand {
                title: Some("Diwali sale".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update banner");

    let updated = state.catalog.list_banners().await;
    assert_eq!(updated.cache, CacheStatus::Miss);
    assert_eq!(updated.items[0].title, "Diwali sale");

    state
        .admin
        .delete_banner(ADMIN_ACTOR, &banner.id.to_hex())
        .await
        .expect("delete banner");

    let deleted = state.catalog.list_banners().await;
    assert_eq!(deleted.cache, CacheStatus::Miss);
    assert!(deleted.items.is_empty());
}

#[tokio::test]
async fn category_delete_refreshes_category_listing() {
    let (_, state) = app(CacheConfig::default());
    let dairy = state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");
    state.catalog.list_categories().await;
    assert_eq!(state.catalog.list_categories().await.cache, CacheStatus::Hit);

    state
        .admin
        .delete_category(ADMIN_ACTOR, &dairy.id.to_hex())
        .await
        .expect("delete dairy");

    let after = state.catalog.list_categories().await;
    assert_eq!(after.cache, CacheStatus::Miss);
    assert!(after.items.is_empty());
}

#[tokio::test]
async fn disabled_cache_always_reads_the_store() {
    let (_, state) = app(CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    });
    state
        .admin
        .create_category(ADMIN_ACTOR, category("Dairy"))
        .await
        .expect("create dairy");

    assert_eq!(state.catalog.list_categories().await.cache, CacheStatus::Miss);
    assert_eq!(state.catalog.list_categories().await.cache, CacheStatus::Miss);
    assert!(state.cache.is_empty());
}

#[tokio::test]
async fn pattern_purge_only_touches_matching_keys() {
    let (_, state) = app(CacheConfig::default());
    state.catalog.list_categories().await;
    state.catalog.list_products(ProductListFilter::default()).await;
    state
        .catalog
        .list_products(ProductListFilter {
            featured_only: true,
            ..Default::default()
        })
        .await;
    state.catalog.list_banners().await;
    assert_eq!(state.cache.len(), 4);

    assert_eq!(state.cache.purge(Some("products")), 2);
    assert_eq!(
        state.cache.keys(),
        vec!["banners:all".to_string(), "categories:all".to_string()]
    );
    assert_eq!(state.cache.purge(None), 2);
    assert!(state.cache.is_empty());
}

struct SlowCategories;

#[async_trait]
impl CategoriesRepo for SlowCategories {
    async fn list_active_categories(&self) -> Result<Vec<CategorySummary>, RepoError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(Vec::new())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn find_category(&self, _id: RecordId) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(None)
    }

    async fn find_category_by_slug(
        &self,
        _slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(None)
    }

    async fn find_category_by_name(
        &self,
        _name: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(None)
    }
}

#[tokio::test]
async fn slow_store_query_hits_the_time_limit() {
    let repos = Arc::new(InMemoryRepositories::new());
    let mut stores = CatalogStores::from_adapter(repos);
    stores.categories = Arc::new(SlowCategories);

    let cache = Arc::new(CatalogCache::new(CacheConfig::default()));
    let service = CatalogReadService::new(stores, cache.clone(), Duration::from_millis(50));

    let listing = service.list_categories().await;
    assert!(listing.degraded);
    assert_eq!(listing.cache, CacheStatus::Miss);
    assert!(cache.is_empty());
}
