use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::catalog::{
    CreateBannerCommand, CreateCategoryCommand, CreateProductCommand, UpdateBannerCommand,
    UpdateCategoryCommand, UpdateProductCommand,
};
use crate::infra::http::{ADMIN_ACTOR, AppState, error::ApiError};

use super::json_body;

const SOURCE: &str = "infra::http::admin::catalog";

pub(super) async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CreateCategoryCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let command = json_body(SOURCE, payload)?;
    let category = state
        .admin
        .create_category(ADMIN_ACTOR, command)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

pub(super) async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCategoryCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let command = json_body(SOURCE, payload)?;
    let category = state
        .admin
        .update_category(ADMIN_ACTOR, &id, command)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok(Json(category).into_response())
}

pub(super) async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .admin
        .delete_category(ADMIN_ACTOR, &id)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<CreateProductCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let command = json_body(SOURCE, payload)?;
    let product = state
        .admin
        .create_product(ADMIN_ACTOR, command)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

pub(super) async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let command = json_body(SOURCE, payload)?;
    let product = state
        .admin
        .update_product(ADMIN_ACTOR, &id, command)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok(Json(product).into_response())
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .admin
        .delete_product(ADMIN_ACTOR, &id)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn create_banner(
    State(state): State<AppState>,
    payload: Result<Json<CreateBannerCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let command = json_body(SOURCE, payload)?;
    let banner = state
        .admin
        .create_banner(ADMIN_ACTOR, command)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(banner)).into_response())
}

pub(super) async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBannerCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let command = json_body(SOURCE, payload)?;
    let banner = state
        .admin
        .update_banner(ADMIN_ACTOR, &id, command)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok(Json(banner).into_response())
}

pub(super) async fn delete_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .admin
        .delete_banner(ADMIN_ACTOR, &id)
        .await
        .map_err(|err| ApiError::from_catalog(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}
