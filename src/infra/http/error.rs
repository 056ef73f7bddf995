use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::addresses::AddressError;
use crate::application::admin::snapshots::SnapshotServiceError;
use crate::application::catalog::CatalogError;
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

pub mod codes {
    pub const VALIDATION: &str = "validation";
    pub const NOT_FOUND: &str = "not_found";
    pub const INTERNAL: &str = "internal";
    pub const STORE_TIMEOUT: &str = "store_timeout";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    source: &'static str,
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            code,
            message: message.into(),
        }
    }

    pub fn validation(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, StatusCode::BAD_REQUEST, codes::VALIDATION, message)
    }

    pub fn not_found(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }

    pub fn internal(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            message,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn from_domain(source: &'static str, err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } => Self::not_found(source, err.to_string()),
            DomainError::Validation { .. } => Self::validation(source, err.to_string()),
        }
    }

    pub fn from_repo(source: &'static str, err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::not_found(source, err.to_string()),
            RepoError::Duplicate { .. }
            | RepoError::InvalidInput { .. }
            | RepoError::Integrity { .. } => Self::validation(source, err.to_string()),
            RepoError::Timeout => Self::new(
                source,
                StatusCode::SERVICE_UNAVAILABLE,
                codes::STORE_TIMEOUT,
                err.to_string(),
            ),
            RepoError::Persistence(_) => Self::internal(source, err.to_string()),
        }
    }

    pub fn from_catalog(source: &'static str, err: CatalogError) -> Self {
        match err {
            CatalogError::Domain(err) => Self::from_domain(source, err),
            CatalogError::Repo(err) => Self::from_repo(source, err),
        }
    }

    pub fn from_snapshots(source: &'static str, err: SnapshotServiceError) -> Self {
        match err {
            SnapshotServiceError::NotFound(_) => Self::not_found(source, err.to_string()),
            SnapshotServiceError::Domain(err) => Self::from_domain(source, err),
            SnapshotServiceError::Repo(err) => Self::from_repo(source, err),
            // A stored payload that no longer decodes is a server-side fault.
            SnapshotServiceError::Snapshot(err) => Self::internal(source, err.to_string()),
        }
    }

    pub fn from_rejection(source: &'static str, rejection: JsonRejection) -> Self {
        Self::validation(source, rejection.body_text())
    }

    pub fn from_query_rejection(source: &'static str, rejection: QueryRejection) -> Self {
        Self::validation(source, rejection.body_text())
    }

    pub fn from_addresses(source: &'static str, err: AddressError) -> Self {
        match err {
            AddressError::Domain(err) => Self::from_domain(source, err),
            AddressError::Repo(err) => Self::from_repo(source, err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.code,
            message: self.message.clone(),
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            self.source,
            self.status,
            format!("{}: {}", self.code, self.message),
        )
        .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_failures_map_to_status_codes() {
        let timeout = ApiError::from_repo("test", RepoError::Timeout);
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.code(), codes::STORE_TIMEOUT);

        let missing = ApiError::from_repo("test", RepoError::NotFound);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let duplicate = ApiError::from_repo(
            "test",
            RepoError::Duplicate {
                constraint: "products_slug_key".to_string(),
            },
        );
        assert_eq!(duplicate.code(), codes::VALIDATION);

        let broken = ApiError::from_repo("test", RepoError::from_persistence("connection reset"));
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_response_carries_report() {
        let response =
            ApiError::from_domain("test", DomainError::validation("name", "must not be empty"))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("error report");
        assert_eq!(report.source, "test");
    }
}
