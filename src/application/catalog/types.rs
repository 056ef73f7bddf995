use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::application::repos::{BannerSummary, CategorySummary, ProductSummary, RepoError};
use crate::cache::CacheStatus;
use crate::domain::error::DomainError;
use crate::domain::slug::{SlugAsyncError, SlugError};

pub const DEFAULT_UNIT: &str = "1 pc";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl CatalogError {
    pub(crate) fn from_slug(field: &'static str, err: SlugAsyncError<RepoError>) -> Self {
        match err {
            SlugAsyncError::Slug(SlugError::Exhausted { base }) => CatalogError::Domain(
                DomainError::validation("slug", format!("no free slug left for `{base}`")),
            ),
            SlugAsyncError::Slug(other) => {
                CatalogError::Domain(DomainError::validation(field, other.to_string()))
            }
            SlugAsyncError::Predicate(err) => CatalogError::Repo(err),
        }
    }

    /// Map a repository `NotFound` onto the entity the caller asked for.
    pub(crate) fn missing(entity: &'static str, id: impl ToString) -> impl FnOnce(RepoError) -> Self {
        let id = id.to_string();
        move |err| match err {
            RepoError::NotFound => CatalogError::Domain(DomainError::not_found(entity, id)),
            other => CatalogError::Repo(other),
        }
    }
}

/// Public shape of a category listing row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: String,
    pub display_order: i32,
    pub priority: i32,
}

impl From<CategorySummary> for CategoryView {
    fn from(row: CategorySummary) -> Self {
        Self {
            id: row.id.to_hex(),
            name: row.name,
            slug: row.slug,
            description: row.description.unwrap_or_default(),
            image: row.image.unwrap_or_default(),
            display_order: row.display_order,
            priority: row.priority,
        }
    }
}

/// Public shape of a product listing row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_id: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount: Option<i32>,
    pub unit: String,
    pub stock: i32,
    pub in_stock: bool,
    pub is_featured: bool,
    pub image: String,
    pub images: Vec<String>,
    pub delivery_time: String,
}

impl From<ProductSummary> for ProductView {
    fn from(row: ProductSummary) -> Self {
        Self {
            id: row.id.to_hex(),
            name: row.name,
            slug: row.slug,
            category_id: row.category_id.to_hex(),
            price: row.price,
            original_price: row.original_price,
            discount: row.discount,
            unit: row.unit,
            stock: row.stock,
            in_stock: row.stock > 0,
            is_featured: row.is_featured,
            image: row.images.first().cloned().unwrap_or_default(),
            images: row.images,
            delivery_time: row.delivery_time.unwrap_or_default(),
        }
    }
}

/// Public shape of a banner listing row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannerView {
    pub id: String,
    pub title: String,
    pub image: String,
    pub link: String,
    pub display_order: i32,
}

impl From<BannerSummary> for BannerView {
    fn from(row: BannerSummary) -> Self {
        Self {
            id: row.id.to_hex(),
            title: row.title,
            image: row.image,
            link: row.link.unwrap_or_default(),
            display_order: row.display_order,
        }
    }
}

/// A storefront listing together with how it was produced.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Arc<Vec<T>>,
    pub cache: CacheStatus,
    /// Set when the store failed and `items` is the empty fallback.
    pub degraded: bool,
    pub max_age: Duration,
}

impl<T> Listing<T> {
    pub fn fresh(items: Arc<Vec<T>>, cache: CacheStatus, max_age: Duration) -> Self {
        Self {
            items,
            cache,
            degraded: false,
            max_age,
        }
    }

    pub fn degraded(cache: CacheStatus, max_age: Duration) -> Self {
        Self {
            items: Arc::new(Vec::new()),
            cache,
            degraded: true,
            max_age,
        }
    }
}

/// Distinguishes an absent field from an explicit `null` in PATCH bodies.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryCommand {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryCommand {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductCommand {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: String,
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub delivery_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductCommand {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub original_price: Option<Option<f64>>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub delivery_time: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBannerCommand {
    pub title: String,
    pub image: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBannerCommand {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub link: Option<Option<String>>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let cleared: UpdateProductCommand =
            serde_json::from_str(r#"{ "original_price": null }"#).expect("parse");
        assert_eq!(cleared.original_price, Some(None));

        let untouched: UpdateProductCommand = serde_json::from_str("{}").expect("parse");
        assert_eq!(untouched.original_price, None);

        let set: UpdateProductCommand =
            serde_json::from_str(r#"{ "original_price": 120.0 }"#).expect("parse");
        assert_eq!(set.original_price, Some(Some(120.0)));
    }

    #[test]
    fn listing_views_fill_missing_fields() {
        let id = crate::domain::ids::RecordId::parse("65a1b2c3d4e5f60718293a4b").expect("id");
        let view = ProductView::from(ProductSummary {
            id,
            name: "Milk".to_string(),
            slug: "milk".to_string(),
            category_id: id,
            price: 30.0,
            original_price: None,
            discount: None,
            unit: "500 ml".to_string(),
            stock: 0,
            is_featured: false,
            images: Vec::new(),
            delivery_time: None,
        });

        assert_eq!(view.id, "65a1b2c3d4e5f60718293a4b");
        assert_eq!(view.image, "");
        assert_eq!(view.delivery_time, "");
        assert!(!view.in_stock);
    }
}
