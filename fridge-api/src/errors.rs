use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::metrics::{REJECTED_PAYLOADS_TOTAL, STORE_FAILURES_TOTAL};

/// Failures surfaced by a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {id} already exists")]
    Conflict { id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Request-level error taxonomy. Every variant maps to exactly one status
/// code and a `{"error": ...}` JSON body; store errors are translated here
/// and never reach the client raw.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{0} is required in the payload")]
    MissingField(&'static str),

    #[error("a document with id {0} already exists")]
    DuplicateId(String),

    #[error("document store unavailable")]
    UpstreamUnavailable,

    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateId(_) => StatusCode::CONFLICT,
            ApiError::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { id } => ApiError::DuplicateId(id),
            StoreError::Unavailable(reason) => {
                error!("Store unavailable: {}", reason);
                STORE_FAILURES_TOTAL.inc();
                ApiError::UpstreamUnavailable
            }
            StoreError::Backend(reason) => {
                error!("Store backend error: {}", reason);
                STORE_FAILURES_TOTAL.inc();
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::InvalidPayload(_) | ApiError::MissingField(_)) {
            REJECTED_PAYLOADS_TOTAL.inc();
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::InvalidPayload("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MissingField("deviceId").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DuplicateId("abc".to_string()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::UpstreamUnavailable.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_error_translation() {
        let err: ApiError = StoreError::Conflict {
            id: "doc-1".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::DuplicateId(id) if id == "doc-1"));

        let err: ApiError = StoreError::Unavailable("timeout".to_string()).into();
        assert!(matches!(err, ApiError::UpstreamUnavailable));

        let err: ApiError = StoreError::Backend("constraint".to_string()).into();
        assert!(matches!(err, ApiError::Internal));
    }

    #[test]
    fn test_missing_field_message() {
        let msg = ApiError::MissingField("deviceId").to_string();
        assert_eq!(msg, "deviceId is required in the payload");
    }
}
