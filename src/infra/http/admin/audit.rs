use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::infra::http::{AppState, error::ApiError};

const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AuditQuery {
    limit: Option<u32>,
}

pub(super) async fn recent_audit(
    State(state): State<AppState>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    const SOURCE: &str = "infra::http::admin::audit";
    let Query(query) =
        query.map_err(|rejection| ApiError::from_query_rejection(SOURCE, rejection))?;
    let entries = state
        .audit
        .list_recent(query.limit.unwrap_or(DEFAULT_LIMIT))
        .await
        .map_err(|err| ApiError::from_repo(SOURCE, err))?;
    Ok(Json(entries).into_response())
}
