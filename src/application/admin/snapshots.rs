//! Inventory snapshots and best-effort rollback.
//!
//! A rollback never aborts half-way because of one bad record: each product
//! is restored on its own and failures are collected into the report. Products
//! are processed one at a time to bound write load on the store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::admin::audit::AdminAuditService;
use crate::application::catalog::CatalogStores;
use crate::application::repos::{
    InventorySnapshotRecord, InventorySnapshotSummary, ProductFields, RepoError, SnapshotsRepo,
};
use crate::cache::{CatalogCache, ResourceFamily};
use crate::domain::catalog::{CategoryRecord, CategoryRef};
use crate::domain::error::DomainError;
use crate::domain::ids::RecordId;
use crate::domain::slug::timestamp_suffixed;
use crate::domain::snapshots::{
    InventoryPayload, SnapshotError, SnapshotProduct, auto_backup_name, default_snapshot_name,
};

const METRIC_ROLLBACK_MS: &str = "quickcart_rollback_ms";
const DEFAULT_LIST_LIMIT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum SnapshotServiceError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("snapshot `{0}` not found")]
    NotFound(RecordId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RollbackStats {
    pub restored: usize,
    pub created: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RollbackReport {
    pub success: bool,
    pub backup_snapshot_id: String,
    pub stats: RollbackStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummaryView {
    pub id: String,
    pub name: String,
    pub product_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<InventorySnapshotSummary> for SnapshotSummaryView {
    fn from(summary: InventorySnapshotSummary) -> Self {
        Self {
            id: summary.id.to_hex(),
            name: summary.name,
            product_count: summary.product_count,
            created_at: summary.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotDetailView {
    #[serde(flatten)]
    pub summary: SnapshotSummaryView,
    pub products: Vec<SnapshotProduct>,
}

enum RestoreOutcome {
    Restored,
    Created,
}

#[derive(Clone)]
pub struct InventorySnapshotService {
    repo: Arc<dyn SnapshotsRepo>,
    stores: CatalogStores,
    cache: Arc<CatalogCache>,
    audit: AdminAuditService,
}

impl InventorySnapshotService {
    pub fn new(
        repo: Arc<dyn SnapshotsRepo>,
        stores: CatalogStores,
        cache: Arc<CatalogCache>,
        audit: AdminAuditService,
    ) -> Self {
        Self {
            repo,
            stores,
            cache,
            audit,
        }
    }

    pub async fn create_snapshot(
        &self,
        actor: &str,
        name: Option<&str>,
    ) -> Result<SnapshotSummaryView, SnapshotServiceError> {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_snapshot_name(OffsetDateTime::now_utc()));

        let record = self.capture(name).await?;
        self.repo.create_snapshot(record.clone()).await?;

        let id = record.id.to_hex();
        if let Err(err) = self
            .audit
            .record(
                actor,
                "inventory.snapshot",
                "inventory_snapshot",
                Some(&id),
                Some(&json!({ "name": record.name, "product_count": record.product_count })),
            )
            .await
        {
            warn!(
                target = "quickcart::application::admin::snapshots",
                snapshot_id = %id,
                error = %err,
                "Failed to append audit entry"
            );
        }

        info!(
            target = "quickcart::application::admin::snapshots",
            snapshot_id = %id,
            product_count = record.product_count,
            "Inventory snapshot created"
        );
        Ok(InventorySnapshotSummary::from(&record).into())
    }

    pub async fn rollback(
        &self,
        actor: &str,
        snapshot_id: &str,
    ) -> Result<RollbackReport, SnapshotServiceError> {
        let started_at = Instant::now();
        let snapshot_id = RecordId::parse(snapshot_id)
            .map_err(|err| DomainError::invalid_id("snapshot_id", &err))?;
        let snapshot = self
            .repo
            .find_snapshot(snapshot_id)
            .await?
            .ok_or(SnapshotServiceError::NotFound(snapshot_id))?;
        let payload = InventoryPayload::decode(&snapshot.content)?;

        let backup = self.capture(auto_backup_name(&snapshot.name)).await?;
        self.repo.create_snapshot(backup.clone()).await?;

        let mut stats = RollbackStats::default();
        let mut errors = Vec::new();
        for product in &payload.products {
            match self.restore_product(product).await {
                Ok(RestoreOutcome::Restored) => stats.restored += 1,
                Ok(RestoreOutcome::Created) => stats.created += 1,
                Err(message) => errors.push(format!("{}: {}", product.name, message)),
            }
        }
        stats.errors = errors.len();

        if stats.restored + stats.created > 0 {
            self.cache.invalidate_family(ResourceFamily::Products);
        }

        let errors = (!errors.is_empty()).then_some(errors);
        let target_id = snapshot.id.to_hex();
        let backup_id = backup.id.to_hex();
        if let Err(err) = self
            .audit
            .record(
                actor,
                "inventory.rollback",
                "inventory_snapshot",
                Some(&target_id),
                Some(&json!({
                    "snapshot_name": snapshot.name,
                    "backup_snapshot_id": backup_id,
                    "restored": stats.restored,
                    "created": stats.created,
                    "errors": errors,
                })),
            )
            .await
        {
            warn!(
                target = "quickcart::application::admin::snapshots",
                snapshot_id = %target_id,
                error = %err,
                "Failed to append audit entry"
            );
        }

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_ROLLBACK_MS).record(elapsed_ms);
        info!(
            target = "quickcart::application::admin::snapshots",
            snapshot_id = %target_id,
            backup_snapshot_id = %backup_id,
            restored = stats.restored,
            created = stats.created,
            errors = stats.errors,
            elapsed_ms,
            "Inventory rollback finished"
        );

        Ok(RollbackReport {
            success: true,
            backup_snapshot_id: backup_id,
            stats,
            errors,
        })
    }

    pub async fn list(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<SnapshotSummaryView>, SnapshotServiceError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let summaries = self.repo.list_snapshots(limit).await?;
        Ok(summaries.into_iter().map(Into::into).collect())
    }

    pub async fn find(&self, id: &str) -> Result<SnapshotDetailView, SnapshotServiceError> {
        let id = RecordId::parse(id).map_err(|err| DomainError::invalid_id("id", &err))?;
        let record = self
            .repo
            .find_snapshot(id)
            .await?
            .ok_or(SnapshotServiceError::NotFound(id))?;
        let payload = InventoryPayload::decode(&record.content)?;

        Ok(SnapshotDetailView {
            summary: InventorySnapshotSummary::from(&record).into(),
            products: payload.products,
        })
    }

    /// Read the whole catalog into a snapshot record, without persisting it.
    async fn capture(&self, name: String) -> Result<InventorySnapshotRecord, SnapshotServiceError> {
        let products = self.stores.products.list_products().await?;
        let categories: HashMap<RecordId, CategoryRef> = self
            .stores
            .categories
            .list_categories()
            .await?
            .into_iter()
            .map(|category| {
                (
                    category.id,
                    CategoryRef {
                        name: category.name,
                        slug: category.slug,
                    },
                )
            })
            .collect();

        let payload = InventoryPayload::capture(
            products
                .iter()
                .map(|product| (product, categories.get(&product.category_id))),
        );

        Ok(InventorySnapshotRecord {
            id: RecordId::generate(),
            name,
            product_count: payload.product_count() as i64,
            content: payload.encode()?,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    async fn restore_product(&self, product: &SnapshotProduct) -> Result<RestoreOutcome, String> {
        let current = self
            .stores
            .products
            .find_product(product.id)
            .await
            .map_err(|err| err.to_string())?;

        match current {
            Some(current) => {
                // Keep the live category when the recorded one is gone.
                let category_id = match self
                    .stores
                    .categories
                    .find_category(product.category_id)
                    .await
                    .map_err(|err| err.to_string())?
                {
                    Some(category) => category.id,
                    None => current.category_id,
                };

                self.stores
                    .products_write
                    .update_product(current.id, restored_fields(product, category_id, None))
                    .await
                    .map_err(|err| err.to_string())?;
                Ok(RestoreOutcome::Restored)
            }
            None => {
                let category = self
                    .resolve_category(product)
                    .await?
                    .ok_or_else(|| "category not found".to_string())?;

                let slug_taken = self
                    .stores
                    .products
                    .find_product_by_slug(&product.slug)
                    .await
                    .map_err(|err| err.to_string())?
                    .is_some();
                let slug = slug_taken.then(|| {
                    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
                    timestamp_suffixed(&product.slug, millis)
                });

                self.stores
                    .products_write
                    .create_product(restored_fields(product, category.id, slug))
                    .await
                    .map_err(|err| err.to_string())?;
                Ok(RestoreOutcome::Created)
            }
        }
    }

    /// Recorded category id first, then the recorded category name.
    async fn resolve_category(
        &self,
        product: &SnapshotProduct,
    ) -> Result<Option<CategoryRecord>, String> {
        let categories = &self.stores.categories;
        if let Some(category) = categories
            .find_category(product.category_id)
            .await
            .map_err(|err| err.to_string())?
        {
            return Ok(Some(category));
        }

        match product.category_name.as_deref() {
            Some(name) => categories
                .find_category_by_name(name)
                .await
                .map_err(|err| err.to_string()),
            None => Ok(None),
        }
    }
}

fn restored_fields(
    product: &SnapshotProduct,
    category_id: RecordId,
    slug: Option<String>,
) -> ProductFields {
    ProductFields {
        name: product.name.clone(),
        slug: slug.unwrap_or_else(|| product.slug.clone()),
        description: product.description.clone(),
        category_id,
        price: product.price,
        original_price: product.original_price,
        discount: product.discount,
        unit: product.unit.clone(),
        stock: product.stock,
        is_active: product.is_active,
        is_featured: product.is_featured,
        images: product.images.clone(),
        tags: product.tags.clone(),
        delivery_time: product.delivery_time.clone(),
    }
}
