//! In-memory repository adapter.
//!
//! Tables are plain vectors guarded by `tokio::sync::RwLock`, kept in
//! insertion order. Nothing survives a restart. Used by tests and by `serve`
//! when no database URL is configured.
//!
//! `set_unavailable(true)` makes every call fail with a persistence error,
//! which lets callers exercise their degraded paths.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::application::repos::{
    AddressFields, AddressesRepo, AuditRepo, BannerFields, BannerSummary, BannersRepo,
    BannersWriteRepo, CategoriesRepo, CategoriesWriteRepo, CategoryFields, CategorySummary,
    HealthRepo, InventorySnapshotRecord, InventorySnapshotSummary, ProductFields,
    ProductListFilter, ProductSummary, ProductsRepo, ProductsWriteRepo, RepoError, SnapshotsRepo,
};
use crate::domain::catalog::{BannerRecord, CategoryRecord, ProductRecord};
use crate::domain::entities::{AddressRecord, AuditLogRecord};
use crate::domain::ids::RecordId;

#[derive(Default)]
pub struct InMemoryRepositories {
    categories: RwLock<Vec<CategoryRecord>>,
    products: RwLock<Vec<ProductRecord>>,
    banners: RwLock<Vec<BannerRecord>>,
    snapshots: RwLock<Vec<InventorySnapshotRecord>>,
    audit: RwLock<Vec<AuditLogRecord>>,
    addresses: RwLock<Vec<AddressRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("store unavailable"));
        }
        Ok(())
    }

    /// Audit entries recorded so far, oldest first.
    pub async fn audit_entries(&self) -> Vec<AuditLogRecord> {
        self.audit.read().await.clone()
    }
}

fn duplicate(constraint: &str) -> RepoError {
    RepoError::Duplicate {
        constraint: constraint.to_string(),
    }
}

fn matches_filter(product: &ProductRecord, filter: &ProductListFilter) -> bool {
    if !product.is_active {
        return false;
    }
    if filter.featured_only && !product.is_featured {
        return false;
    }
    if filter
        .category_id
        .is_some_and(|category_id| product.category_id != category_id)
    {
        return false;
    }
    match filter.search.as_deref() {
        Some(search) => {
            let needle = search.to_lowercase();
            product.name.to_lowercase().contains(&needle)
                || product
                    .description
                    .as_deref()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
                || product.tags.iter().any(|tag| tag.to_lowercase() == needle)
        }
        None => true,
    }
}

#[async_trait]
impl CategoriesRepo for InMemoryRepositories {
    async fn list_active_categories(&self) -> Result<Vec<CategorySummary>, RepoError> {
        self.check()?;
        let mut active: Vec<CategoryRecord> = self
            .categories
            .read()
            .await
            .iter()
            .filter(|category| category.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(b.priority.cmp(&a.priority))
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(active
            .into_iter()
            .map(|category| CategorySummary {
                id: category.id,
                name: category.name,
                slug: category.slug,
                description: category.description,
                image: category.image,
                display_order: category.display_order,
                priority: category.priority,
            })
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.check()?;
        let mut all = self.categories.read().await.clone();
        all.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(all)
    }

    async fn find_category(&self, id: RecordId) -> Result<Option<CategoryRecord>, RepoError> {
        self.check()?;
        let categories = self.categories.read().await;
        Ok(categories.iter().find(|category| category.id == id).cloned())
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        self.check()?;
        let categories = self.categories.read().await;
        Ok(categories
            .iter()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        self.check()?;
        let categories = self.categories.read().await;
        Ok(categories
            .iter()
            .find(|category| category.name == name)
            .cloned())
    }
}

#[async_trait]
impl CategoriesWriteRepo for InMemoryRepositories {
    async fn create_category(&self, fields: CategoryFields) -> Result<CategoryRecord, RepoError> {
        self.check()?;
        let mut categories = self.categories.write().await;
        if categories.iter().any(|category| category.slug == fields.slug) {
            return Err(duplicate("categories_slug_key"));
        }

        let now = OffsetDateTime::now_utc();
        let record = CategoryRecord {
            id: RecordId::generate(),
            name: fields.name,
            slug: fields.slug,
            description: fields.description,
            image: fields.image,
            display_order: fields.display_order,
            priority: fields.priority,
            is_active: fields.is_active,
            created_at: now,
            updated_at: now,
        };
        categories.push(record.clone());
        Ok(record)
    }

    async fn update_category(
        &self,
        id: RecordId,
        fields: CategoryFields,
    ) -> Result<CategoryRecord, RepoError> {
        self.check()?;
        let mut categories = self.categories.write().await;
        if categories
            .iter()
            .any(|category| category.slug == fields.slug && category.id != id)
        {
            return Err(duplicate("categories_slug_key"));
        }

        let category = categories
            .iter_mut()
            .find(|category| category.id == id)
            .ok_or(RepoError::NotFound)?;
        category.name = fields.name;
        category.slug = fields.slug;
        category.description = fields.description;
        category.image = fields.image;
        category.display_order = fields.display_order;
        category.priority = fields.priority;
        category.is_active = fields.is_active;
        category.updated_at = OffsetDateTime::now_utc();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: RecordId) -> Result<(), RepoError> {
        self.check()?;
        let mut categories = self.categories.write().await;
        let before = categories.len();
        categories.retain(|category| category.id != id);
        if categories.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ProductsRepo for InMemoryRepositories {
    async fn list_active_products(
        &self,
        filter: &ProductListFilter,
    ) -> Result<Vec<ProductSummary>, RepoError> {
        self.check()?;
        let products = self.products.read().await;
        Ok(products
            .iter()
            .rev()
            .filter(|product| matches_filter(product, filter))
            .map(|product| ProductSummary {
                id: product.id,
                name: product.name.clone(),
                slug: product.slug.clone(),
                category_id: product.category_id,
                price: product.price,
                original_price: product.original_price,
                discount: product.discount,
                unit: product.unit.clone(),
                stock: product.stock,
                is_featured: product.is_featured,
                images: product.images.clone(),
                delivery_time: product.delivery_time.clone(),
            })
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        self.check()?;
        Ok(self.products.read().await.clone())
    }

    async fn find_product(&self, id: RecordId) -> Result<Option<ProductRecord>, RepoError> {
        self.check()?;
        let products = self.products.read().await;
        Ok(products.iter().find(|product| product.id == id).cloned())
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        self.check()?;
        let products = self.products.read().await;
        Ok(products.iter().find(|product| product.slug == slug).cloned())
    }
}

#[async_trait]
impl ProductsWriteRepo for InMemoryRepositories {
    async fn create_product(&self, fields: ProductFields) -> Result<ProductRecord, RepoError> {
        self.check()?;
        let mut products = self.products.write().await;
        if products.iter().any(|product| product.slug == fields.slug) {
            return Err(duplicate("products_slug_key"));
        }

        let now = OffsetDateTime::now_utc();
        let record = ProductRecord {
            id: RecordId::generate(),
            name: fields.name,
            slug: fields.slug,
            description: fields.description,
            category_id: fields.category_id,
            price: fields.price,
            original_price: fields.original_price,
            discount: fields.discount,
            unit: fields.unit,
            stock: fields.stock,
            is_active: fields.is_active,
            is_featured: fields.is_featured,
            images: fields.images,
            tags: fields.tags,
            delivery_time: fields.delivery_time,
            created_at: now,
            updated_at: now,
        };
        products.push(record.clone());
        Ok(record)
    }

    async fn update_product(
        &self,
        id: RecordId,
        fields: ProductFields,
    ) -> Result<ProductRecord, RepoError> {
        self.check()?;
        let mut products = self.products.write().await;
        if products
            .iter()
            .any(|product| product.slug == fields.slug && product.id != id)
        {
            return Err(duplicate("products_slug_key"));
        }

        let product = products
            .iter_mut()
            .find(|product| product.id == id)
            .ok_or(RepoError::NotFound)?;
        *product = ProductRecord {
            id,
            name: fields.name,
            slug: fields.slug,
            description: fields.description,
            category_id: fields.category_id,
            price: fields.price,
            original_price: fields.original_price,
            discount: fields.discount,
            unit: fields.unit,
            stock: fields.stock,
            is_active: fields.is_active,
            is_featured: fields.is_featured,
            images: fields.images,
            tags: fields.tags,
            delivery_time: fields.delivery_time,
            created_at: product.created_at,
            updated_at: OffsetDateTime::now_utc(),
        };
        Ok(product.clone())
    }

    async fn delete_product(&self, id: RecordId) -> Result<(), RepoError> {
        self.check()?;
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|product| product.id != id);
        if products.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl BannersRepo for InMemoryRepositories {
    async fn list_active_banners(&self) -> Result<Vec<BannerSummary>, RepoError> {
        self.check()?;
        let mut active: Vec<BannerRecord> = self
            .banners
            .read()
            .await
            .iter()
            .rev()
            .filter(|banner| banner.is_active)
            .cloned()
            .collect();
        active.sort_by_key(|banner| banner.display_order);

        Ok(active
            .into_iter()
            .map(|banner| BannerSummary {
                id: banner.id,
                title: banner.title,
                image: banner.image,
                link: banner.link,
                display_order: banner.display_order,
            })
            .collect())
    }

    async fn find_banner(&self, id: RecordId) -> Result<Option<BannerRecord>, RepoError> {
        self.check()?;
        let banners = self.banners.read().await;
        Ok(banners.iter().find(|banner| banner.id == id).cloned())
    }
}

#[async_trait]
impl BannersWriteRepo for InMemoryRepositories {
    async fn create_banner(&self, fields: BannerFields) -> Result<BannerRecord, RepoError> {
        self.check()?;
        let now = OffsetDateTime::now_utc();
        let record = BannerRecord {
            id: RecordId::generate(),
            title: fields.title,
            image: fields.image,
            link: fields.link,
            display_order: fields.display_order,
            is_active: fields.is_active,
            created_at: now,
            updated_at: now,
        };
        self.banners.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_banner(
        &self,
        id: RecordId,
        fields: BannerFields,
    ) -> Result<BannerRecord, RepoError> {
        self.check()?;
        let mut banners = self.banners.write().await;
        let banner = banners
            .iter_mut()
            .find(|banner| banner.id == id)
            .ok_or(RepoError::NotFound)?;
        banner.title = fields.title;
        banner.image = fields.image;
        banner.link = fields.link;
        banner.display_order = fields.display_order;
        banner.is_active = fields.is_active;
        banner.updated_at = OffsetDateTime::now_utc();
        Ok(banner.clone())
    }

    async fn delete_banner(&self, id: RecordId) -> Result<(), RepoError> {
        self.check()?;
        let mut banners = self.banners.write().await;
        let before = banners.len();
        banners.retain(|banner| banner.id != id);
        if banners.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotsRepo for InMemoryRepositories {
    async fn create_snapshot(&self, record: InventorySnapshotRecord) -> Result<(), RepoError> {
        self.check()?;
        let mut snapshots = self.snapshots.write().await;
        if snapshots.iter().any(|snapshot| snapshot.id == record.id) {
            return Err(duplicate("inventory_snapshots_pkey"));
        }
        snapshots.push(record);
        Ok(())
    }

    async fn find_snapshot(
        &self,
        id: RecordId,
    ) -> Result<Option<InventorySnapshotRecord>, RepoError> {
        self.check()?;
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.iter().find(|snapshot| snapshot.id == id).cloned())
    }

    async fn list_snapshots(
        &self,
        limit: u32,
    ) -> Result<Vec<InventorySnapshotSummary>, RepoError> {
        self.check()?;
        let snapshots = self.snapshots.read().await;
        let mut newest_first: Vec<&InventorySnapshotRecord> = snapshots.iter().rev().collect();
        // Stable sort keeps insertion order for equal timestamps.
        newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(newest_first
            .into_iter()
            .take(limit.clamp(1, 100) as usize)
            .map(InventorySnapshotSummary::from)
            .collect())
    }
}

#[async_trait]
impl AuditRepo for InMemoryRepositories {
    async fn append_log(&self, record: AuditLogRecord) -> Result<(), RepoError> {
        self.check()?;
        self.audit.write().await.push(record);
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditLogRecord>, RepoError> {
        self.check()?;
        let audit = self.audit.read().await;
        Ok(audit
            .iter()
            .rev()
            .take(limit.clamp(1, 200) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AddressesRepo for InMemoryRepositories {
    async fn list_addresses(&self, owner_id: &str) -> Result<Vec<AddressRecord>, RepoError> {
        self.check()?;
        let addresses = self.addresses.read().await;
        Ok(addresses
            .iter()
            .filter(|address| address.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_address(
        &self,
        owner_id: &str,
        id: RecordId,
    ) -> Result<Option<AddressRecord>, RepoError> {
        self.check()?;
        let addresses = self.addresses.read().await;
        Ok(addresses
            .iter()
            .find(|address| address.owner_id == owner_id && address.id == id)
            .cloned())
    }

    async fn create_address(
        &self,
        owner_id: &str,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<AddressRecord, RepoError> {
        self.check()?;
        let now = OffsetDateTime::now_utc();
        let record = AddressRecord {
            id: RecordId::generate(),
            owner_id: owner_id.to_string(),
            label: fields.label,
            line1: fields.line1,
            line2: fields.line2,
            city: fields.city,
            postal_code: fields.postal_code,
            phone: fields.phone,
            is_default,
            created_at: now,
            updated_at: now,
        };
        self.addresses.write().await.push(record.clone());
        Ok(record)
    }

    async fn set_default_flag(&self, id: RecordId, is_default: bool) -> Result<(), RepoError> {
        self.check()?;
        let mut addresses = self.addresses.write().await;
        let address = addresses
            .iter_mut()
            .find(|address| address.id == id)
            .ok_or(RepoError::NotFound)?;
        address.is_default = is_default;
        address.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn delete_address(&self, owner_id: &str, id: RecordId) -> Result<(), RepoError> {
        self.check()?;
        let mut addresses = self.addresses.write().await;
        let before = addresses.len();
        addresses.retain(|address| !(address.owner_id == owner_id && address.id == id));
        if addresses.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl HealthRepo for InMemoryRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.check()
    }
}
