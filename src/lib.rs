//! Catalog service for a quick-commerce grocery storefront.
//!
//! Storefront listings are served read-through from an in-process TTL cache
//! that admin writes invalidate per resource family. Inventory snapshots
//! capture the product catalog and can be rolled back item by item.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
