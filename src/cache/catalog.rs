//! Catalog listing cache.
//!
//! Wraps a [`CacheStore`] holding the three storefront listings. Reads and
//! writes go through [`CacheKey`], and writers evict by [`ResourceFamily`], so
//! no caller builds key strings by hand. Pattern purges stay available for the
//! admin endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::application::catalog::types::{BannerView, CategoryView, ProductView};

use super::config::{CacheConfig, DEGRADED_MAX_AGE_SECS};
use super::keys::{CacheKey, ResourceFamily};
use super::store::CacheStore;

/// How a listing was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

#[derive(Debug, Clone)]
pub enum CatalogPayload {
    Categories(Arc<Vec<CategoryView>>),
    Products(Arc<Vec<ProductView>>),
    Banners(Arc<Vec<BannerView>>),
}

/// A view type that can be stored under one of the listing keys.
pub trait CachedListing: Sized + Send + Sync + 'static {
    fn wrap(items: Arc<Vec<Self>>) -> CatalogPayload;
    fn unwrap(payload: CatalogPayload) -> Option<Arc<Vec<Self>>>;
}

impl CachedListing for CategoryView {
    fn wrap(items: Arc<Vec<Self>>) -> CatalogPayload {
        CatalogPayload::Categories(items)
    }

    fn unwrap(payload: CatalogPayload) -> Option<Arc<Vec<Self>>> {
        match payload {
            CatalogPayload::Categories(items) => Some(items),
            _ => None,
        }
    }
}

impl CachedListing for ProductView {
    fn wrap(items: Arc<Vec<Self>>) -> CatalogPayload {
        CatalogPayload::Products(items)
    }

    fn unwrap(payload: CatalogPayload) -> Option<Arc<Vec<Self>>> {
        match payload {
            CatalogPayload::Products(items) => Some(items),
            _ => None,
        }
    }
}

impl CachedListing for BannerView {
    fn wrap(items: Arc<Vec<Self>>) -> CatalogPayload {
        CatalogPayload::Banners(items)
    }

    fn unwrap(payload: CatalogPayload) -> Option<Arc<Vec<Self>>> {
        match payload {
            CatalogPayload::Banners(items) => Some(items),
            _ => None,
        }
    }
}

pub struct CatalogCache {
    config: CacheConfig,
    store: CacheStore<CatalogPayload>,
}

impl CatalogCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            store: CacheStore::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn ttl_for(&self, family: ResourceFamily) -> Duration {
        match family {
            ResourceFamily::Categories => self.config.categories_ttl,
            ResourceFamily::Products => self.config.products_ttl,
            ResourceFamily::Banners => self.config.banners_ttl,
        }
    }

    pub fn degraded_max_age(&self) -> Duration {
        Duration::from_secs(DEGRADED_MAX_AGE_SECS)
    }

    pub fn get<T: CachedListing>(&self, key: CacheKey) -> Option<Arc<Vec<T>>> {
        if !self.config.enabled {
            return None;
        }
        self.store.get(key.as_str()).and_then(T::unwrap)
    }

    pub fn put<T: CachedListing>(&self, key: CacheKey, items: Arc<Vec<T>>) {
        if !self.config.enabled {
            return;
        }
        self.store
            .set(key.as_str(), T::wrap(items), self.ttl_for(key.family()));
    }

    /// Evict every listing of `family`. Returns how many entries were present.
    pub fn invalidate_family(&self, family: ResourceFamily) -> usize {
        let removed = family
            .keys()
            .iter()
            .filter(|key| self.store.invalidate(key.as_str()))
            .count();
        debug!(
            target = "quickcart::cache::catalog",
            family = family.as_str(),
            removed,
            "Invalidated catalog listings"
        );
        removed
    }

    /// Evict keys containing `pattern`, or everything when no pattern is given.
    pub fn purge(&self, pattern: Option<&str>) -> usize {
        match pattern {
            Some(pattern) => self.store.invalidate_pattern(pattern),
            None => self.store.clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }
}
