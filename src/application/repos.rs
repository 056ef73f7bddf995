//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::catalog::{BannerRecord, CategoryRecord, ProductRecord};
use crate::domain::entities::{AddressRecord, AuditLogRecord};
use crate::domain::ids::RecordId;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Listing projection of an active category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub display_order: i32,
    pub priority: i32,
}

/// Listing projection of an active product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    pub category_id: RecordId,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount: Option<i32>,
    pub unit: String,
    pub stock: i32,
    pub is_featured: bool,
    pub images: Vec<String>,
    pub delivery_time: Option<String>,
}

/// Listing projection of an active banner.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerSummary {
    pub id: RecordId,
    pub title: String,
    pub image: String,
    pub link: Option<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProductListFilter {
    pub featured_only: bool,
    pub category_id: Option<RecordId>,
    pub search: Option<String>,
}

impl ProductListFilter {
    /// Filtered and searched listings are answered from the store directly.
    pub fn is_ad_hoc(&self) -> bool {
        self.category_id.is_some() || self.search.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CategoryFields {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub display_order: i32,
    pub priority: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: RecordId,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount: Option<i32>,
    pub unit: String,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub delivery_time: Option<String>,
}

impl From<&ProductRecord> for ProductFields {
    fn from(record: &ProductRecord) -> Self {
        Self {
            name: record.name.clone(),
            slug: record.slug.clone(),
            description: record.description.clone(),
            category_id: record.category_id,
            price: record.price,
            original_price: record.original_price,
            discount: record.discount,
            unit: record.unit.clone(),
            stock: record.stock,
            is_active: record.is_active,
            is_featured: record.is_featured,
            images: record.images.clone(),
            tags: record.tags.clone(),
            delivery_time: record.delivery_time.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BannerFields {
    pub title: String,
    pub image: String,
    pub link: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct AddressFields {
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InventorySnapshotRecord {
    pub id: RecordId,
    pub name: String,
    pub content: Value,
    pub product_count: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct InventorySnapshotSummary {
    pub id: RecordId,
    pub name: String,
    pub product_count: i64,
    pub created_at: OffsetDateTime,
}

impl From<&InventorySnapshotRecord> for InventorySnapshotSummary {
    fn from(record: &InventorySnapshotRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            product_count: record.product_count,
            created_at: record.created_at,
        }
    }
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn list_active_categories(&self) -> Result<Vec<CategorySummary>, RepoError>;
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;
    async fn find_category(&self, id: RecordId) -> Result<Option<CategoryRecord>, RepoError>;
    async fn find_category_by_slug(&self, slug: &str)
    -> Result<Option<CategoryRecord>, RepoError>;
    /// Exact, case-sensitive name match.
    async fn find_category_by_name(&self, name: &str)
    -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesWriteRepo: Send + Sync {
    async fn create_category(&self, fields: CategoryFields) -> Result<CategoryRecord, RepoError>;
    async fn update_category(
        &self,
        id: RecordId,
        fields: CategoryFields,
    ) -> Result<CategoryRecord, RepoError>;
    async fn delete_category(&self, id: RecordId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn list_active_products(
        &self,
        filter: &ProductListFilter,
    ) -> Result<Vec<ProductSummary>, RepoError>;
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError>;
    async fn find_product(&self, id: RecordId) -> Result<Option<ProductRecord>, RepoError>;
    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError>;
}

#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    async fn create_product(&self, fields: ProductFields) -> Result<ProductRecord, RepoError>;
    async fn update_product(
        &self,
        id: RecordId,
        fields: ProductFields,
    ) -> Result<ProductRecord, RepoError>;
    async fn delete_product(&self, id: RecordId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait BannersRepo: Send + Sync {
    async fn list_active_banners(&self) -> Result<Vec<BannerSummary>, RepoError>;
    async fn find_banner(&self, id: RecordId) -> Result<Option<BannerRecord>, RepoError>;
}

#[async_trait]
pub trait BannersWriteRepo: Send + Sync {
    async fn create_banner(&self, fields: BannerFields) -> Result<BannerRecord, RepoError>;
    async fn update_banner(
        &self,
        id: RecordId,
        fields: BannerFields,
    ) -> Result<BannerRecord, RepoError>;
    async fn delete_banner(&self, id: RecordId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SnapshotsRepo: Send + Sync {
    async fn create_snapshot(&self, record: InventorySnapshotRecord) -> Result<(), RepoError>;
    async fn find_snapshot(
        &self,
        id: RecordId,
    ) -> Result<Option<InventorySnapshotRecord>, RepoError>;
    /// Newest first.
    async fn list_snapshots(&self, limit: u32)
    -> Result<Vec<InventorySnapshotSummary>, RepoError>;
}

#[async_trait]
pub trait AuditRepo: Send + Sync {
    async fn append_log(&self, record: AuditLogRecord) -> Result<(), RepoError>;
    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditLogRecord>, RepoError>;
}

#[async_trait]
pub trait AddressesRepo: Send + Sync {
    /// Oldest first.
    async fn list_addresses(&self, owner_id: &str) -> Result<Vec<AddressRecord>, RepoError>;
    async fn find_address(
        &self,
        owner_id: &str,
        id: RecordId,
    ) -> Result<Option<AddressRecord>, RepoError>;
    async fn create_address(
        &self,
        owner_id: &str,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<AddressRecord, RepoError>;
    async fn set_default_flag(&self, id: RecordId, is_default: bool) -> Result<(), RepoError>;
    async fn delete_address(&self, owner_id: &str, id: RecordId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
