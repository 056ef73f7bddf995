use serde_json::json;
use tracing::{info, warn};

use crate::application::repos::{BannerFields, CategoryFields, ProductFields};
use crate::cache::ResourceFamily;
use crate::domain::catalog::{
    BannerRecord, CategoryRecord, ProductRecord, compute_discount, optional_text, require_price,
    require_stock, require_text,
};
use crate::domain::error::DomainError;
use crate::domain::ids::RecordId;
use crate::domain::slug::generate_unique_slug_async;

use super::service::AdminCatalogService;
use super::types::{
    CatalogError, CreateBannerCommand, CreateCategoryCommand, CreateProductCommand, DEFAULT_UNIT,
    UpdateBannerCommand, UpdateCategoryCommand, UpdateProductCommand,
};

fn parse_id(field: &'static str, raw: &str) -> Result<RecordId, CatalogError> {
    RecordId::parse(raw).map_err(|err| CatalogError::Domain(DomainError::invalid_id(field, &err)))
}

impl AdminCatalogService {
    pub async fn create_category(
        &self,
        actor: &str,
        command: CreateCategoryCommand,
    ) -> Result<CategoryRecord, CatalogError> {
        let name = require_text("name", &command.name)?;
        let slug = self.unique_category_slug(&name, None).await?;

        let category = self
            .stores
            .categories_write
            .create_category(CategoryFields {
                name,
                slug,
                description: optional_text(command.description.as_deref()),
                image: optional_text(command.image.as_deref()),
                display_order: command.display_order,
                priority: command.priority,
                is_active: command.is_active,
            })
            .await?;

        self.after_write(
            ResourceFamily::Categories,
            actor,
            "category.create",
            "category",
            category.id,
            json!({ "name": category.name, "slug": category.slug }),
        )
        .await;
        Ok(category)
    }

    pub async fn update_category(
        &self,
        actor: &str,
        id: &str,
        command: UpdateCategoryCommand,
    ) -> Result<CategoryRecord, CatalogError> {
        let id = parse_id("id", id)?;
        let existing = self
            .stores
            .categories
            .find_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("category", id))?;

        let mut fields = CategoryFields {
            name: existing.name.clone(),
            slug: existing.slug.clone(),
            description: existing.description.clone(),
            image: existing.image.clone(),
            display_order: existing.display_order,
            priority: existing.priority,
            is_active: existing.is_active,
        };

        if let Some(name) = command.name.as_deref() {
            let name = require_text("name", name)?;
            if name != existing.name {
                fields.slug = self.unique_category_slug(&name, Some(id)).await?;
            }
            fields.name = name;
        }
        if let Some(description) = command.description {
            fields.description = optional_text(description.as_deref());
        }
        if let Some(image) = command.image {
            fields.image = optional_text(image.as_deref());
        }
        if let Some(display_order) = command.display_order {
            fields.display_order = display_order;
        }
        if let Some(priority) = command.priority {
            fields.priority = priority;
        }
        if let Some(is_active) = command.is_active {
            fields.is_active = is_active;
        }

        let category = self
            .stores
            .categories_write
            .update_category(id, fields)
            .await
            .map_err(CatalogError::missing("category", id))?;

        self.after_write(
            ResourceFamily::Categories,
            actor,
            "category.update",
            "category",
            category.id,
            json!({ "name": category.name, "slug": category.slug }),
        )
        .await;
        Ok(category)
    }

    /// Products pointing at the category keep their dangling reference.
    pub async fn delete_category(&self, actor: &str, id: &str) -> Result<(), CatalogError> {
        let id = parse_id("id", id)?;
        self.stores
            .categories_write
            .delete_category(id)
            .await
            .map_err(CatalogError::missing("category", id))?;

        self.after_write(
            ResourceFamily::Categories,
            actor,
            "category.delete",
            "category",
            id,
            json!(null),
        )
        .await;
        Ok(())
    }

    pub async fn create_product(
        &self,
        actor: &str,
        command: CreateProductCommand,
    ) -> Result<ProductRecord, CatalogError> {
        let name = require_text("name", &command.name)?;
        let category_id = parse_id("category_id", &command.category_id)?;
        let price = require_price("price", command.price)?;
        let original_price = command
            .original_price
            .map(|value| require_price("original_price", value))
            .transpose()?;
        let stock = require_stock(command.stock)?;
        let unit = optional_text(command.unit.as_deref()).unwrap_or_else(|| DEFAULT_UNIT.into());

        self.ensure_category_exists(category_id).await?;
        let slug = self.unique_product_slug(&name, None).await?;

        let product = self
            .stores
            .products_write
            .create_product(ProductFields {
                name,
                slug,
                description: optional_text(command.description.as_deref()),
                category_id,
                price,
                original_price,
                discount: compute_discount(price, original_price),
                unit,
                stock,
                is_active: command.is_active,
                is_featured: command.is_featured,
                images: command.images,
                tags: command.tags,
                delivery_time: optional_text(command.delivery_time.as_deref()),
            })
            .await?;

        self.after_write(
            ResourceFamily::Products,
            actor,
            "product.create",
            "product",
            product.id,
            json!({ "name": product.name, "slug": product.slug, "price": product.price }),
        )
        .await;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        actor: &str,
        id: &str,
        command: UpdateProductCommand,
    ) -> Result<ProductRecord, CatalogError> {
        let id = parse_id("id", id)?;
        let existing = self
            .stores
            .products
            .find_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))?;

        let mut fields = ProductFields::from(&existing);

        if let Some(name) = command.name.as_deref() {
            let name = require_text("name", name)?;
            if name != existing.name {
                fields.slug = self.unique_product_slug(&name, Some(id)).await?;
            }
            fields.name = name;
        }
        if let Some(description) = command.description {
            fields.description = optional_text(description.as_deref());
        }
        if let Some(raw) = command.category_id.as_deref() {
            let category_id = parse_id("category_id", raw)?;
            if category_id != existing.category_id {
                self.ensure_category_exists(category_id).await?;
            }
            fields.category_id = category_id;
        }

        let pricing_changed = command.price.is_some() || command.original_price.is_some();
        if let Some(price) = command.price {
            fields.price = require_price("price", price)?;
        }
        if let Some(original_price) = command.original_price {
            fields.original_price = original_price
                .map(|value| require_price("original_price", value))
                .transpose()?;
        }
        if pricing_changed {
            fields.discount = compute_discount(fields.price, fields.original_price);
        }

        if let Some(unit) = command.unit.as_deref() {
            fields.unit = require_text("unit", unit)?;
        }
        if let Some(stock) = command.stock {
            fields.stock = require_stock(stock)?;
        }
        if let Some(is_active) = command.is_active {
            fields.is_active = is_active;
        }
        if let Some(is_featured) = command.is_featured {
            fields.is_featured = is_featured;
        }
        if let Some(images) = command.images {
            fields.images = images;
        }
        if let Some(tags) = command.tags {
            fields.tags = tags;
        }
        if let Some(delivery_time) = command.delivery_time {
            fields.delivery_time = optional_text(delivery_time.as_deref());
        }

        let product = self
            .stores
            .products_write
            .update_product(id, fields)
            .await
            .map_err(CatalogError::missing("product", id))?;

        self.after_write(
            ResourceFamily::Products,
            actor,
            "product.update",
            "product",
            product.id,
            json!({
                "name": product.name,
                "slug": product.slug,
                "price": product.price,
                "discount": product.discount,
            }),
        )
        .await;
        Ok(product)
    }

    pub async fn delete_product(&self, actor: &str, id: &str) -> Result<(), CatalogError> {
        let id = parse_id("id", id)?;
        self.stores
            .products_write
            .delete_product(id)
            .await
            .map_err(CatalogError::missing("product", id))?;

        self.after_write(
            ResourceFamily::Products,
            actor,
            "product.delete",
            "product",
            id,
            json!(null),
        )
        .await;
        Ok(())
    }

    pub async fn create_banner(
        &self,
        actor: &str,
        command: CreateBannerCommand,
    ) -> Result<BannerRecord, CatalogError> {
        let banner = self
            .stores
            .banners_write
            .create_banner(BannerFields {
                title: require_text("title", &command.title)?,
                image: require_text("image", &command.image)?,
                link: optional_text(command.link.as_deref()),
                display_order: command.display_order,
                is_active: command.is_active,
            })
            .await?;

        self.after_write(
            ResourceFamily::Banners,
            actor,
            "banner.create",
            "banner",
            banner.id,
            json!({ "title": banner.title }),
        )
        .await;
        Ok(banner)
    }

    pub async fn update_banner(
        &self,
        actor: &str,
        id: &str,
        command: UpdateBannerCommand,
    ) -> Result<BannerRecord, CatalogError> {
        let id = parse_id("id", id)?;
        let existing = self
            .stores
            .banners
            .find_banner(id)
            .await?
            .ok_or_else(|| DomainError::not_found("banner", id))?;

        let mut fields = BannerFields {
            title: existing.title,
            image: existing.image,
            link: existing.link,
            display_order: existing.display_order,
            is_active: existing.is_active,
        };
        if let Some(title) = command.title.as_deref() {
            fields.title = require_text("title", title)?;
        }
        if let Some(image) = command.image.as_deref() {
            fields.image = require_text("image", image)?;
        }
        if let Some(link) = command.link {
            fields.link = optional_text(link.as_deref());
        }
        if let Some(display_order) = command.display_order {
            fields.display_order = display_order;
        }
        if let Some(is_active) = command.is_active {
            fields.is_active = is_active;
        }

        let banner = self
            .stores
            .banners_write
            .update_banner(id, fields)
            .await
            .map_err(CatalogError::missing("banner", id))?;

        self.after_write(
            ResourceFamily::Banners,
            actor,
            "banner.update",
            "banner",
            banner.id,
            json!({ "title": banner.title }),
        )
        .await;
        Ok(banner)
    }

    pub async fn delete_banner(&self, actor: &str, id: &str) -> Result<(), CatalogError> {
        let id = parse_id("id", id)?;
        self.stores
            .banners_write
            .delete_banner(id)
            .await
            .map_err(CatalogError::missing("banner", id))?;

        self.after_write(
            ResourceFamily::Banners,
            actor,
            "banner.delete",
            "banner",
            id,
            json!(null),
        )
        .await;
        Ok(())
    }

    /// Evict the family, then append the audit entry. The write is already
    /// committed, so an audit failure is logged rather than returned.
    async fn after_write(
        &self,
        family: ResourceFamily,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: RecordId,
        payload: serde_json::Value,
    ) {
        self.cache.invalidate_family(family);

        let entity_id = entity_id.to_hex();
        let payload = (!payload.is_null()).then_some(&payload);
        if let Err(err) = self
            .audit
            .record(actor, action, entity_type, Some(&entity_id), payload)
            .await
        {
            warn!(
                target = "quickcart::application::catalog",
                action,
                entity_id = %entity_id,
                error = %err,
                "Failed to append audit entry"
            );
        }

        info!(
            target = "quickcart::application::catalog",
            action,
            entity_id = %entity_id,
            family = family.as_str(),
            "Catalog write committed"
        );
    }

    async fn ensure_category_exists(&self, id: RecordId) -> Result<(), CatalogError> {
        match self.stores.categories.find_category(id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::Domain(DomainError::validation(
                "category_id",
                format!("category `{id}` does not exist"),
            ))),
        }
    }

    async fn unique_category_slug(
        &self,
        name: &str,
        current: Option<RecordId>,
    ) -> Result<String, CatalogError> {
        let reader = self.stores.categories.clone();
        generate_unique_slug_async(name, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_category_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none_or(|record| Some(record.id) == current))
            }
        })
        .await
        .map_err(|err| CatalogError::from_slug("name", err))
    }

    async fn unique_product_slug(
        &self,
        name: &str,
        current: Option<RecordId>,
    ) -> Result<String, CatalogError> {
        let reader = self.stores.products.clone();
        generate_unique_slug_async(name, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_product_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none_or(|record| Some(record.id) == current))
            }
        })
        .await
        .map_err(|err| CatalogError::from_slug("name", err))
    }
}
