use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{AddressFields, AddressesRepo, RepoError},
    domain::{entities::AddressRecord, ids::RecordId},
};

use super::{PostgresRepositories, map_sqlx_error, util::expect_affected};

const ADDRESS_COLUMNS: &str = "id, owner_id, label, line1, line2, city, postal_code, phone, \
     is_default, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: RecordId,
    owner_id: String,
    label: String,
    line1: String,
    line2: Option<String>,
    city: String,
    postal_code: String,
    phone: Option<String>,
    is_default: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AddressRow> for AddressRecord {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            label: row.label,
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            postal_code: row.postal_code,
            phone: row.phone,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AddressesRepo for PostgresRepositories {
    async fn list_addresses(&self, owner_id: &str) -> Result<Vec<AddressRecord>, RepoError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE owner_id = $1 ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_address(
        &self,
        owner_id: &str,
        id: RecordId,
    ) -> Result<Option<AddressRecord>, RepoError> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE owner_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(owner_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn create_address(
        &self,
        owner_id: &str,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<AddressRecord, RepoError> {
        let sql = format!(
            "INSERT INTO addresses ({ADDRESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) RETURNING {ADDRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(RecordId::generate())
            .bind(owner_id)
            .bind(fields.label)
            .bind(fields.line1)
            .bind(fields.line2)
            .bind(fields.city)
            .bind(fields.postal_code)
            .bind(fields.phone)
            .bind(is_default)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn set_default_flag(&self, id: RecordId, is_default: bool) -> Result<(), RepoError> {
        let result =
            sqlx::query("UPDATE addresses SET is_default = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(is_default)
                .bind(OffsetDateTime::now_utc())
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn delete_address(&self, owner_id: &str, id: RecordId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM addresses WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
