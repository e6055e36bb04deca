//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Each [`ServiceErrorKind`] maps to exactly one status code; error text is
//! never inspected to pick a response, and internal details are never echoed
//! to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service::{ServiceError, ServiceErrorKind};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "ACCESS_DENIED").
    pub code: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed request: JSON, key encoding, helper payload (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Presented key does not match the enrolled proof (401).
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Identity has no credential (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Identity already enrolled (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Generation, verification or storage broke (500). Logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// A dependency is not ready (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::AccessDenied(_) => (StatusCode::UNAUTHORIZED, "ACCESS_DENIED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ServiceErrorKind::Input => Self::BadRequest(message),
            ServiceErrorKind::NotFound => Self::NotFound(message),
            ServiceErrorKind::Conflict => Self::Conflict(message),
            ServiceErrorKind::Internal => Self::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use ppba_prover::ZkError;

    #[test]
    fn input_errors_are_400() {
        let err: AppError = ServiceError::from(ZkError::InvalidKeyEncoding("x".into())).into();
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn prover_failures_are_500() {
        let err: AppError =
            ServiceError::from(ZkError::ProofGenerationFailed("boom".into())).into();
        assert_eq!(err.status_and_code(), (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"));
    }

    #[test]
    fn duplicate_identity_is_409() {
        let err: AppError =
            ServiceError::from(StoreError::DuplicateIdentity("alice".into())).into();
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn missing_record_is_404() {
        let err: AppError = ServiceError::NotFound("bob".into()).into();
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "NOT_FOUND"));
    }

    #[tokio::test]
    async fn internal_message_is_hidden() {
        use http_body_util::BodyExt;

        let resp = AppError::Internal("pk file corrupt at /secret/path".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(!String::from_utf8_lossy(&bytes).contains("/secret/path"));
    }

    #[tokio::test]
    async fn client_errors_echo_their_message() {
        use http_body_util::BodyExt;

        let resp = AppError::NotFound("no credential enrolled for 'bob'".into()).into_response();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"]["message"].as_str().unwrap().contains("bob"));
    }
}
