//! Cache configuration.
//!
//! Per-family TTLs for the catalog listing cache, set under `[cache]` in
//! `quickcart.toml`.

use std::time::Duration;

const DEFAULT_CATEGORIES_TTL_SECS: u64 = 300;
const DEFAULT_PRODUCTS_TTL_SECS: u64 = 120;
const DEFAULT_BANNERS_TTL_SECS: u64 = 600;

/// Max-age advertised to clients when a listing fell back to an empty result.
pub const DEGRADED_MAX_AGE_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// When false every listing goes straight to the store.
    pub enabled: bool,
    pub categories_ttl: Duration,
    pub products_ttl: Duration,
    pub banners_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            categories_ttl: Duration::from_secs(DEFAULT_CATEGORIES_TTL_SECS),
            products_ttl: Duration::from_secs(DEFAULT_PRODUCTS_TTL_SECS),
            banners_ttl: Duration::from_secs(DEFAULT_BANNERS_TTL_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            categories_ttl: Duration::from_secs(settings.categories_ttl_seconds.get()),
            products_ttl: Duration::from_secs(settings.products_ttl_seconds.get()),
            banners_ttl: Duration::from_secs(settings.banners_ttl_seconds.get()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttls_follow_family_policy() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.categories_ttl, Duration::from_secs(300));
        assert_eq!(config.products_ttl, Duration::from_secs(120));
        assert_eq!(config.banners_ttl, Duration::from_secs(600));
    }
}
