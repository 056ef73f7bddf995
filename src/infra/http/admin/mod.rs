mod audit;
mod cache;
mod catalog;
mod snapshots;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    routing::{get, patch, post},
};
use serde::de::DeserializeOwned;

use super::AppState;
use super::error::ApiError;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/categories", post(catalog::create_category))
        .route(
            "/api/admin/categories/{id}",
            patch(catalog::update_category).delete(catalog::delete_category),
        )
        .route("/api/admin/products", post(catalog::create_product))
        .route(
            "/api/admin/products/{id}",
            patch(catalog::update_product).delete(catalog::delete_product),
        )
        .route("/api/admin/banners", post(catalog::create_banner))
        .route(
            "/api/admin/banners/{id}",
            patch(catalog::update_banner).delete(catalog::delete_banner),
        )
        .route(
            "/api/admin/inventory/snapshots",
            get(snapshots::list_snapshots).post(snapshots::create_snapshot),
        )
        .route(
            "/api/admin/inventory/snapshots/{id}",
            get(snapshots::snapshot_detail),
        )
        .route(
            "/api/admin/inventory/snapshots/{id}/rollback",
            post(snapshots::rollback_snapshot),
        )
        .route("/api/admin/cache/purge", post(cache::purge_cache))
        .route("/api/admin/audit", get(audit::recent_audit))
}

/// Unwrap a JSON body, turning extractor rejections into `validation` errors.
fn json_body<T: DeserializeOwned>(
    source: &'static str,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::from_rejection(source, rejection))
}
