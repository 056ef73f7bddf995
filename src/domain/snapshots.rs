//! Portable inventory snapshot payloads.
//!
//! A snapshot stores every product together with the name and slug of the
//! category it referenced. Identifiers are written in their 24-hex form and
//! timestamps as RFC 3339 strings so a payload can outlive the store that
//! produced it. Payloads are versioned; decoding rejects unknown versions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::domain::catalog::{CategoryRef, ProductRecord};
use crate::domain::ids::RecordId;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Name used when a snapshot is taken without one, e.g. `Snapshot 2024-05-01 10:00:00 UTC`.
pub fn default_snapshot_name(now: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    let stamp = now
        .to_offset(time::UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("Snapshot {stamp}")
}

/// Name of the safety snapshot taken before rolling back to `target`.
pub fn auto_backup_name(target: &str) -> String {
    format!("Auto-backup before rollback to {target}")
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unsupported snapshot schema version {found} (expected {SNAPSHOT_SCHEMA_VERSION})")]
    UnsupportedSchema { found: u32 },
    #[error("snapshot payload could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotProduct {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: RecordId,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_slug: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub discount: Option<i32>,
    pub unit: String,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub delivery_time: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SnapshotProduct {
    pub fn capture(product: &ProductRecord, category: Option<&CategoryRef>) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            category_id: product.category_id,
            category_name: category.map(|c| c.name.clone()),
            category_slug: category.map(|c| c.slug.clone()),
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
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryPayload {
    pub schema_version: u32,
    pub products: Vec<SnapshotProduct>,
}

impl InventoryPayload {
    pub fn capture<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a ProductRecord, Option<&'a CategoryRef>)>,
    {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            products: rows
                .into_iter()
                .map(|(product, category)| SnapshotProduct::capture(product, category))
                .collect(),
        }
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn encode(&self) -> Result<Value, SnapshotError> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }

    pub fn decode(content: &Value) -> Result<Self, SnapshotError> {
        let payload: InventoryPayload = serde_json::from_value(content.clone())?;
        if payload.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedSchema {
                found: payload.schema_version,
            });
        }
        payload.validate()?;
        Ok(payload)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(SnapshotError::Validation(format!(
                    "product {} has an empty name",
                    product.id
                )));
            }
            if product.slug.trim().is_empty() {
                return Err(SnapshotError::Validation(format!(
                    "product {} has an empty slug",
                    product.id
                )));
            }
            if !product.price.is_finite() {
                return Err(SnapshotError::Validation(format!(
                    "product {} has a non-finite price",
                    product.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn sample_product() -> ProductRecord {
        ProductRecord {
            id: RecordId::parse("65a1b2c3d4e5f60718293a4b").expect("id"),
            name: "Potato Chips".to_string(),
            slug: "potato-chips".to_string(),
            description: None,
            category_id: RecordId::parse("65a1b2c3d4e5f60718293a4c").expect("id"),
            price: 50.0,
            original_price: Some(60.0),
            discount: Some(17),
            unit: "200 g".to_string(),
            stock: 12,
            is_active: true,
            is_featured: false,
            images: vec!["https://cdn.example/chips.png".to_string()],
            tags: vec!["snacks".to_string()],
            delivery_time: Some("10 mins".to_string()),
            created_at: datetime!(2024-05-01 10:00 UTC),
            updated_at: datetime!(2024-05-02 11:30 UTC),
        }
    }

    #[test]
    fn encoded_payload_uses_portable_forms() {
        let product = sample_product();
        let category = CategoryRef {
            name: "Snacks".to_string(),
            slug: "snacks".to_string(),
        };
        let payload = InventoryPayload::capture([(&product, Some(&category))]);
        let value = payload.encode().expect("encode");

        let first = &value["products"][0];
        assert_eq!(value["schema_version"], 1);
        assert_eq!(first["id"], "65a1b2c3d4e5f60718293a4b");
        assert_eq!(first["category_name"], "Snacks");
        assert_eq!(first["created_at"], "2024-05-01T10:00:00Z");

        let decoded = InventoryPayload::decode(&value).expect("decode");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn generated_names() {
        assert_eq!(
            default_snapshot_name(datetime!(2024-05-01 10:00 UTC)),
            "Snapshot 2024-05-01 10:00:00 UTC"
        );
        assert_eq!(
            auto_backup_name("Before sale"),
            "Auto-backup before rollback to Before sale"
        );
    }

    #[test]
    fn decode_rejects_unknown_schema_version() {
        let value = serde_json::json!({ "schema_version": 99, "products": [] });
        assert!(matches!(
            InventoryPayload::decode(&value),
            Err(SnapshotError::UnsupportedSchema { found: 99 })
        ));
    }

    #[test]
    fn decode_rejects_blank_product_names() {
        let mut product = sample_product();
        product.name = "  ".to_string();
        let payload = InventoryPayload {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            products: vec![SnapshotProduct::capture(&product, None)],
        };
        let value = serde_json::to_value(&payload).expect("raw encode");

        assert!(matches!(
            InventoryPayload::decode(&value),
            Err(SnapshotError::Validation(_))
        ));
    }
}
