//! API error types.

use crate::service::FetchError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shelf_core::ValidationErrors;

/// Message sent with every validation failure.
pub const VALIDATION_MESSAGE: &str = "The given data was invalid.";

/// Failure envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Validation failure body.
#[derive(Debug, Serialize)]
pub struct ValidationResponse<'a> {
    pub message: &'static str,
    pub errors: &'a ValidationErrors,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("metadata error: {0}")]
    Metadata(#[from] shelf_metadata::MetadataError),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Fetch(e) => status_for_code(e.code()),
            Self::Metadata(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message. Store failures are not described to the caller.
    pub fn message(&self) -> String {
        match self {
            Self::Metadata(_) => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

/// Use a fault code as the response status; 0 or anything that is not an
/// HTTP status becomes 500.
pub fn status_for_code(code: u16) -> StatusCode {
    if (100..600).contains(&code) {
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Validation(errors) => (
                status,
                Json(ValidationResponse {
                    message: VALIDATION_MESSAGE,
                    errors,
                }),
            )
                .into_response(),
            Self::Metadata(e) => {
                tracing::error!(error = %e, "Metadata store failure");
                (
                    status,
                    Json(ErrorResponse {
                        success: false,
                        message: self.message(),
                    }),
                )
                    .into_response()
            }
            Self::Fetch(_) => (
                status,
                Json(ErrorResponse {
                    success: false,
                    message: self.message(),
                }),
            )
                .into_response(),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
