//! Error types for slidemark-al

use crate::services::{ModelServerError, RegistryError, SampleError, SlideStoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., quota already full for a label
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No slide is selected yet (409)
    #[error("No slide selected")]
    NoActiveSlide,

    /// Working-set violation from the sample accumulator
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// Registry lookup or refresh failure
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The model server rejected or failed a submission (502); the
    /// working set is untouched
    #[error("Submission failed: {0}")]
    SubmissionFailed(ModelServerError),

    /// Slide store collaborator failure (502)
    #[error("Slide store error: {0}")]
    SlideStore(#[from] SlideStoreError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// slidemark-common error
    #[error("Common error: {0}")]
    Common(#[from] slidemark_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::NoActiveSlide => (
                StatusCode::CONFLICT,
                "NO_ACTIVE_SLIDE",
                "No slide selected".to_string(),
            ),
            ApiError::Sample(ref err) => {
                let (status, code) = match err {
                    SampleError::QuotaExceeded { .. } => {
                        (StatusCode::CONFLICT, "QUOTA_EXCEEDED")
                    }
                    SampleError::InvalidBatch { .. } => {
                        (StatusCode::BAD_REQUEST, "INVALID_BATCH")
                    }
                    SampleError::DuplicateBatch { .. } => {
                        (StatusCode::CONFLICT, "DUPLICATE_BATCH")
                    }
                };
                (status, code, err.to_string())
            }
            ApiError::Registry(ref err) => {
                let (status, code) = match err {
                    RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, "MODEL_NOT_FOUND"),
                    RegistryError::ArtifactInvalid(_) => {
                        (StatusCode::CONFLICT, "MODEL_INVALID")
                    }
                    RegistryError::Refresh(_) => (StatusCode::BAD_GATEWAY, "REGISTRY_REFRESH"),
                };
                (status, code, err.to_string())
            }
            ApiError::SubmissionFailed(ref err) => (
                StatusCode::BAD_GATEWAY,
                "SUBMISSION_FAILED",
                err.to_string(),
            ),
            ApiError::SlideStore(ref err) => {
                let (status, code) = match err {
                    SlideStoreError::NoDetections(_) => {
                        (StatusCode::NOT_FOUND, "NO_DETECTIONS")
                    }
                    _ => (StatusCode::BAD_GATEWAY, "SLIDE_STORE_ERROR"),
                };
                (status, code, err.to_string())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
