use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::catalog::optional_text;
use crate::infra::http::{ADMIN_ACTOR, AppState, error::ApiError};

const SOURCE: &str = "infra::http::admin::cache";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PurgeRequest {
    pattern: Option<String>,
}

#[derive(Debug, Serialize)]
struct PurgeResponse {
    evicted: usize,
}

/// Drop cache entries whose key contains `pattern`, or every entry when no
/// pattern is given.
pub(super) async fn purge_cache(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PurgeRequest::default()
    } else {
        serde_json::from_slice::<PurgeRequest>(&body)
            .map_err(|err| ApiError::validation(SOURCE, err.to_string()))?
    };
    let pattern = optional_text(request.pattern.as_deref());

    let evicted = state.cache.purge(pattern.as_deref());
    info!(
        target = "quickcart::http::admin::cache",
        pattern = pattern.as_deref().unwrap_or("*"),
        evicted,
        "Cache purged"
    );

    let payload = serde_json::json!({ "pattern": pattern, "evicted": evicted });
    if let Err(err) = state
        .audit
        .record(ADMIN_ACTOR, "cache.purge", "cache", None, Some(&payload))
        .await
    {
        warn!(
            target = "quickcart::http::admin::cache",
            error = %err,
            "Failed to append audit entry"
        );
    }

    Ok(Json(PurgeResponse { evicted }).into_response())
}
