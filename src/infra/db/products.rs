use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{
        ProductFields, ProductListFilter, ProductSummary, ProductsRepo, ProductsWriteRepo,
        RepoError,
    },
    domain::{catalog::ProductRecord, ids::RecordId},
};

use super::{PostgresRepositories, map_sqlx_error, util::expect_affected};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, category_id, price, original_price, \
     discount, unit, stock, is_active, is_featured, images, tags, delivery_time, created_at, \
     updated_at";

const LISTING_LIMIT: i64 = 500;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: RecordId,
    name: String,
    slug: String,
    description: Option<String>,
    category_id: RecordId,
    price: f64,
    original_price: Option<f64>,
    discount: Option<i32>,
    unit: String,
    stock: i32,
    is_active: bool,
    is_featured: bool,
    images: Vec<String>,
    tags: Vec<String>,
    delivery_time: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            category_id: row.category_id,
            price: row.price,
            original_price: row.original_price,
            discount: row.discount,
            unit: row.unit,
            stock: row.stock,
            is_active: row.is_active,
            is_featured: row.is_featured,
            images: row.images,
            tags: row.tags,
            delivery_time: row.delivery_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductSummaryRow {
    id: RecordId,
    name: String,
    slug: String,
    category_id: RecordId,
    price: f64,
    original_price: Option<f64>,
    discount: Option<i32>,
    unit: String,
    stock: i32,
    is_featured: bool,
    images: Vec<String>,
    delivery_time: Option<String>,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            category_id: row.category_id,
            price: row.price,
            original_price: row.original_price,
            discount: row.discount,
            unit: row.unit,
            stock: row.stock,
            is_featured: row.is_featured,
            images: row.images,
            delivery_time: row.delivery_time,
        }
    }
}

impl PostgresRepositories {
    fn apply_product_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q ProductListFilter) {
        if filter.featured_only {
            qb.push(" AND is_featured ");
        }

        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ");
            qb.push_bind(category_id);
        }

        if let Some(search) = filter.search.as_ref() {
            let pattern = format!("%{search}%");
            qb.push(" AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE lower(tag) = ");
            qb.push_bind(search.to_lowercase());
            qb.push("))");
        }
    }

    async fn fetch_product_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<ProductRecord>, RepoError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE {condition} LIMIT 1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn list_active_products(
        &self,
        filter: &ProductListFilter,
    ) -> Result<Vec<ProductSummary>, RepoError> {
        let mut qb = QueryBuilder::new(
            "SELECT id, name, slug, category_id, price, original_price, discount, unit, stock, \
             is_featured, images, delivery_time FROM products WHERE is_active ",
        );
        Self::apply_product_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(LISTING_LIMIT);

        let rows = qb
            .build_query_as::<ProductSummaryRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_product(&self, id: RecordId) -> Result<Option<ProductRecord>, RepoError> {
        self.fetch_product_where("id = $1", &id.to_hex()).await
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        self.fetch_product_where("slug = $1", slug).await
    }
}

#[async_trait]
impl ProductsWriteRepo for PostgresRepositories {
    async fn create_product(&self, fields: ProductFields) -> Result<ProductRecord, RepoError> {
        let sql = format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(RecordId::generate())
            .bind(fields.name)
            .bind(fields.slug)
            .bind(fields.description)
            .bind(fields.category_id)
            .bind(fields.price)
            .bind(fields.original_price)
            .bind(fields.discount)
            .bind(fields.unit)
            .bind(fields.stock)
            .bind(fields.is_active)
            .bind(fields.is_featured)
            .bind(fields.images)
            .bind(fields.tags)
            .bind(fields.delivery_time)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_product(
        &self,
        id: RecordId,
        fields: ProductFields,
    ) -> Result<ProductRecord, RepoError> {
        let sql = format!(
            "UPDATE products SET name = $2, slug = $3, description = $4, category_id = $5, \
             price = $6, original_price = $7, discount = $8, unit = $9, stock = $10, \
             is_active = $11, is_featured = $12, images = $13, tags = $14, delivery_time = $15, \
             updated_at = $16 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(fields.name)
            .bind(fields.slug)
            .bind(fields.description)
            .bind(fields.category_id)
            .bind(fields.price)
            .bind(fields.original_price)
            .bind(fields.discount)
            .bind(fields.unit)
            .bind(fields.stock)
            .bind(fields.is_active)
            .bind(fields.is_featured)
            .bind(fields.images)
            .bind(fields.tags)
            .bind(fields.delivery_time)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(Into::into).ok_or(RepoError::NotFound)
    }

    async fn delete_product(&self, id: RecordId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
