//! In-process cache for storefront catalog listings.
//!
//! The store is a plain TTL map constructed at startup and shared through
//! `Arc`; nothing survives a restart. Configuration lives under `[cache]`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! categories_ttl_seconds = 300
//! products_ttl_seconds = 120
//! banners_ttl_seconds = 600
//! ```

mod catalog;
mod config;
mod keys;
mod lock;
mod store;

pub use catalog::{CacheStatus, CachedListing, CatalogCache, CatalogPayload};
pub use config::{CacheConfig, DEGRADED_MAX_AGE_SECS};
pub use keys::{CacheKey, ResourceFamily};
pub use store::{CacheEntry, CacheStore};
