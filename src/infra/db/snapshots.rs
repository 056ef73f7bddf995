use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    InventorySnapshotRecord, InventorySnapshotSummary, RepoError, SnapshotsRepo,
};
use crate::domain::ids::RecordId;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: RecordId,
    name: String,
    content: serde_json::Value,
    product_count: i64,
    created_at: OffsetDateTime,
}

impl From<SnapshotRow> for InventorySnapshotRecord {
    fn from(row: SnapshotRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            content: row.content,
            product_count: row.product_count,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotSummaryRow {
    id: RecordId,
    name: String,
    product_count: i64,
    created_at: OffsetDateTime,
}

#[async_trait]
impl SnapshotsRepo for PostgresRepositories {
    async fn create_snapshot(&self, record: InventorySnapshotRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO inventory_snapshots (id, name, content, product_count, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id)
        .bind(record.name)
        .bind(record.content)
        .bind(record.product_count)
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_snapshot(
        &self,
        id: RecordId,
    ) -> Result<Option<InventorySnapshotRecord>, RepoError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT id, name, content, product_count, created_at \
             FROM inventory_snapshots WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_snapshots(
        &self,
        limit: u32,
    ) -> Result<Vec<InventorySnapshotSummary>, RepoError> {
        let rows = sqlx::query_as::<_, SnapshotSummaryRow>(
            "SELECT id, name, product_count, created_at FROM inventory_snapshots \
             ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(i64::from(limit.clamp(1, 100)))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| InventorySnapshotSummary {
                id: row.id,
                name: row.name,
                product_count: row.product_count,
                created_at: row.created_at,
            })
            .collect())
    }
}
