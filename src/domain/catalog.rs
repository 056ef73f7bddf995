//! Catalog entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::error::DomainError;
use crate::domain::ids::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub display_order: i32,
    pub priority: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: RecordId,
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
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannerRecord {
    pub id: RecordId,
    pub title: String,
    pub image: String,
    pub link: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Name and slug of the category a product pointed at when it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub name: String,
    pub slug: String,
}

/// Percentage discount of `price` against `original_price`, rounded half away
/// from zero. `None` when there is no positive original price to compare to.
pub fn compute_discount(price: f64, original_price: Option<f64>) -> Option<i32> {
    let original = original_price?;
    if !original.is_finite() || original <= 0.0 || !price.is_finite() {
        return None;
    }

    Some(((original - price) / original * 100.0).round() as i32)
}

/// Trimmed, non-empty text.
pub fn require_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Trimmed text, with blank input collapsing to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn require_price(field: &'static str, value: f64) -> Result<f64, DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(
            field,
            "must be a finite, non-negative amount",
        ));
    }
    Ok(value)
}

pub fn require_stock(value: i32) -> Result<i32, DomainError> {
    if value < 0 {
        return Err(DomainError::validation("stock", "must not be negative"));
    }
    Ok(value)
}
