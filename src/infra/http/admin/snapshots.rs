use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::infra::http::{ADMIN_ACTOR, AppState, error::ApiError};

const SOURCE: &str = "infra::http::admin::snapshots";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SnapshotListQuery {
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateSnapshotRequest {
    name: Option<String>,
}

pub(super) async fn list_snapshots(
    State(state): State<AppState>,
    query: Result<Query<SnapshotListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) =
        query.map_err(|rejection| ApiError::from_query_rejection(SOURCE, rejection))?;
    let snapshots = state
        .snapshots
        .list(query.limit)
        .await
        .map_err(|err| ApiError::from_snapshots(SOURCE, err))?;
    Ok(Json(snapshots).into_response())
}

/// The body is optional; an empty one takes the timestamped default name.
pub(super) async fn create_snapshot(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSnapshotRequest::default()
    } else {
        serde_json::from_slice::<CreateSnapshotRequest>(&body)
            .map_err(|err| ApiError::validation(SOURCE, err.to_string()))?
    };

    let snapshot = state
        .snapshots
        .create_snapshot(ADMIN_ACTOR, request.name.as_deref())
        .await
        .map_err(|err| ApiError::from_snapshots(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(snapshot)).into_response())
}

pub(super) async fn snapshot_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = state
        .snapshots
        .find(&id)
        .await
        .map_err(|err| ApiError::from_snapshots(SOURCE, err))?;
    Ok(Json(snapshot).into_response())
}

pub(super) async fn rollback_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let report = state
        .snapshots
        .rollback(ADMIN_ACTOR, &id)
        .await
        .map_err(|err| ApiError::from_snapshots(SOURCE, err))?;
    Ok(Json(report).into_response())
}
