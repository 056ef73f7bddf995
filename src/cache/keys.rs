//! Cache key definitions.
//!
//! Keys are namespaced strings (`products:featured`) so they stay readable in
//! logs and in the admin purge endpoint, but the set is closed: writers
//! invalidate a [`ResourceFamily`], which expands to exactly the keys it owns.

use std::fmt;

/// A group of cached listings sharing an invalidation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Categories,
    Products,
    Banners,
}

impl ResourceFamily {
    pub const ALL: [ResourceFamily; 3] = [
        ResourceFamily::Categories,
        ResourceFamily::Products,
        ResourceFamily::Banners,
    ];

    /// Every key a write to this family must evict.
    pub fn keys(self) -> &'static [CacheKey] {
        match self {
            ResourceFamily::Categories => &[CacheKey::CategoriesAll],
            ResourceFamily::Products => &[CacheKey::ProductsAll, CacheKey::ProductsFeatured],
            ResourceFamily::Banners => &[CacheKey::BannersAll],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceFamily::Categories => "categories",
            ResourceFamily::Products => "products",
            ResourceFamily::Banners => "banners",
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-family listing keys. Filtered queries are never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CategoriesAll,
    ProductsAll,
    ProductsFeatured,
    BannersAll,
}

impl CacheKey {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::CategoriesAll => "categories:all",
            CacheKey::ProductsAll => "products:all",
            CacheKey::ProductsFeatured => "products:featured",
            CacheKey::BannersAll => "banners:all",
        }
    }

    pub fn family(self) -> ResourceFamily {
        match self {
            CacheKey::CategoriesAll => ResourceFamily::Categories,
            CacheKey::ProductsAll | CacheKey::ProductsFeatured => ResourceFamily::Products,
            CacheKey::BannersAll => ResourceFamily::Banners,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
