use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use crate::application::addresses::CreateAddressCommand;

use super::AppState;
use super::error::ApiError;

const SOURCE: &str = "infra::http::addresses";

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/{owner}/addresses",
            get(list_addresses).post(create_address),
        )
        .route(
            "/api/users/{owner}/addresses/{id}/default",
            post(set_default_address),
        )
        .route("/api/users/{owner}/addresses/{id}", delete(delete_address))
}

async fn list_addresses(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Response, ApiError> {
    let addresses = state
        .addresses
        .list(&owner)
        .await
        .map_err(|err| ApiError::from_addresses(SOURCE, err))?;
    Ok(Json(addresses).into_response())
}

async fn create_address(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    payload: Result<Json<CreateAddressCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(command) = payload.map_err(|rejection| ApiError::from_rejection(SOURCE, rejection))?;
    let address = state
        .addresses
        .create(&owner, command)
        .await
        .map_err(|err| ApiError::from_addresses(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(address)).into_response())
}

async fn set_default_address(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let address = state
        .addresses
        .set_default(&owner, &id)
        .await
        .map_err(|err| ApiError::from_addresses(SOURCE, err))?;
    Ok(Json(address).into_response())
}

async fn delete_address(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .addresses
        .delete(&owner, &id)
        .await
        .map_err(|err| ApiError::from_addresses(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}
