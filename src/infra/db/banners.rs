use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{BannerFields, BannerSummary, BannersRepo, BannersWriteRepo, RepoError},
    domain::{catalog::BannerRecord, ids::RecordId},
};

use super::{PostgresRepositories, map_sqlx_error, util::expect_affected};

const BANNER_COLUMNS: &str =
    "id, title, image, link, display_order, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BannerRow {
    id: RecordId,
    title: String,
    image: String,
    link: Option<String>,
    display_order: i32,
    is_active: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<BannerRow> for BannerRecord {
    fn from(row: BannerRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            image: row.image,
            link: row.link,
            display_order: row.display_order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BannerSummaryRow {
    id: RecordId,
    title: String,
    image: String,
    link: Option<String>,
    display_order: i32,
}

#[async_trait]
impl BannersRepo for PostgresRepositories {
    async fn list_active_banners(&self) -> Result<Vec<BannerSummary>, RepoError> {
        let rows = sqlx::query_as::<_, BannerSummaryRow>(
            "SELECT id, title, image, link, display_order FROM banners \
             WHERE is_active ORDER BY display_order ASC, created_at DESC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| BannerSummary {
                id: row.id,
                title: row.title,
                image: row.image,
                link: row.link,
                display_order: row.display_order,
            })
            .collect())
    }

    async fn find_banner(&self, id: RecordId) -> Result<Option<BannerRecord>, RepoError> {
        let sql = format!("SELECT {BANNER_COLUMNS} FROM banners WHERE id = $1");
        let row = sqlx::query_as::<_, BannerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl BannersWriteRepo for PostgresRepositories {
    async fn create_banner(&self, fields: BannerFields) -> Result<BannerRecord, RepoError> {
        let sql = format!(
            "INSERT INTO banners ({BANNER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {BANNER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BannerRow>(&sql)
            .bind(RecordId::generate())
            .bind(fields.title)
            .bind(fields.image)
            .bind(fields.link)
            .bind(fields.display_order)
            .bind(fields.is_active)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_banner(
        &self,
        id: RecordId,
        fields: BannerFields,
    ) -> Result<BannerRecord, RepoError> {
        let sql = format!(
            "UPDATE banners SET title = $2, image = $3, link = $4, display_order = $5, \
             is_active = $6, updated_at = $7 WHERE id = $1 RETURNING {BANNER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BannerRow>(&sql)
            .bind(id)
            .bind(fields.title)
            .bind(fields.image)
            .bind(fields.link)
            .bind(fields.display_order)
            .bind(fields.is_active)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(Into::into).ok_or(RepoError::NotFound)
    }

    async fn delete_banner(&self, id: RecordId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM banners WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
