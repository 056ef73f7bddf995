use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::application::catalog::Listing;
use crate::application::error::ErrorReport;
use crate::application::repos::ProductListFilter;
use crate::domain::catalog::optional_text;
use crate::domain::error::DomainError;
use crate::domain::ids::RecordId;

use super::AppState;
use super::error::ApiError;

const X_CACHE: &str = "x-cache";

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(product_detail))
        .route("/api/banners", get(list_banners))
        .route("/health", get(health))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductsQuery {
    featured: Option<bool>,
    category: Option<String>,
    search: Option<String>,
}

impl ProductsQuery {
    fn into_filter(self) -> Result<ProductListFilter, DomainError> {
        let category_id = optional_text(self.category.as_deref())
            .map(|raw| {
                RecordId::parse(&raw).map_err(|err| DomainError::invalid_id("category", &err))
            })
            .transpose()?;

        Ok(ProductListFilter {
            featured_only: self.featured.unwrap_or(false),
            category_id,
            search: optional_text(self.search.as_deref()),
        })
    }
}

async fn list_categories(State(state): State<AppState>) -> Response {
    listing_response(state.catalog.list_categories().await)
}

async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    const SOURCE: &str = "infra::http::public::list_products";
    let Query(query) =
        query.map_err(|rejection| ApiError::from_query_rejection(SOURCE, rejection))?;
    let filter = query
        .into_filter()
        .map_err(|err| ApiError::from_domain(SOURCE, err))?;
    Ok(listing_response(state.catalog.list_products(filter).await))
}

async fn list_banners(State(state): State<AppState>) -> Response {
    listing_response(state.catalog.list_banners().await)
}

async fn product_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let product = state
        .catalog
        .find_product(&id)
        .await
        .map_err(|err| ApiError::from_catalog("infra::http::public::product_detail", err))?;
    Ok(Json(product).into_response())
}

async fn health(State(state): State<AppState>) -> Response {
    match state.health.ping().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(err) => {
            let mut response = (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response();
            ErrorReport::from_error(
                "infra::http::public::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

fn listing_response<T: Serialize>(listing: Listing<T>) -> Response {
    let mut response = Json(listing.items.as_ref()).into_response();
    let headers = response.headers_mut();
    headers.insert(X_CACHE, HeaderValue::from_static(listing.cache.as_str()));
    if let Ok(value) =
        HeaderValue::from_str(&format!("public, max-age={}", listing.max_age.as_secs()))
    {
        headers.insert(header::CACHE_CONTROL, value);
    }
    response
}
