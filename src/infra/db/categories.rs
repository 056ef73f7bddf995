use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CategoriesRepo, CategoriesWriteRepo, CategoryFields, CategorySummary, RepoError,
    },
    domain::{catalog::CategoryRecord, ids::RecordId},
};

use super::{PostgresRepositories, map_sqlx_error};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, display_order, priority, \
     is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: RecordId,
    name: String,
    slug: String,
    description: Option<String>,
    image: Option<String>,
    display_order: i32,
    priority: i32,
    is_active: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image: row.image,
            display_order: row.display_order,
            priority: row.priority,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategorySummaryRow {
    id: RecordId,
    name: String,
    slug: String,
    description: Option<String>,
    image: Option<String>,
    display_order: i32,
    priority: i32,
}

impl From<CategorySummaryRow> for CategorySummary {
    fn from(row: CategorySummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image: row.image,
            display_order: row.display_order,
            priority: row.priority,
        }
    }
}

impl PostgresRepositories {
    async fn fetch_category_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE {condition} LIMIT 1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn list_active_categories(&self) -> Result<Vec<CategorySummary>, RepoError> {
        let rows = sqlx::query_as::<_, CategorySummaryRow>(
            "SELECT id, name, slug, description, image, display_order, priority \
             FROM categories WHERE is_active \
             ORDER BY display_order ASC, priority DESC, name ASC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY display_order, name");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_category(&self, id: RecordId) -> Result<Option<CategoryRecord>, RepoError> {
        self.fetch_category_where("id = $1", &id.to_hex()).await
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        self.fetch_category_where("slug = $1", slug).await
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        self.fetch_category_where("name = $1", name).await
    }
}

#[async_trait]
impl CategoriesWriteRepo for PostgresRepositories {
    async fn create_category(&self, fields: CategoryFields) -> Result<CategoryRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            "INSERT INTO categories ({CATEGORY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(RecordId::generate())
            .bind(fields.name)
            .bind(fields.slug)
            .bind(fields.description)
            .bind(fields.image)
            .bind(fields.display_order)
            .bind(fields.priority)
            .bind(fields.is_active)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: RecordId,
        fields: CategoryFields,
    ) -> Result<CategoryRecord, RepoError> {
        let sql = format!(
            "UPDATE categories SET name = $2, slug = $3, description = $4, image = $5, \
             display_order = $6, priority = $7, is_active = $8, updated_at = $9 \
             WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .bind(fields.name)
            .bind(fields.slug)
            .bind(fields.description)
            .bind(fields.image)
            .bind(fields.display_order)
            .bind(fields.priority)
            .bind(fields.is_active)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(Into::into).ok_or(RepoError::NotFound)
    }

    async fn delete_category(&self, id: RecordId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        super::util::expect_affected(result.rows_affected())
    }
}
