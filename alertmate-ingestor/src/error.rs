//! API error types and response formatting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::notification::FieldError;

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body is not JSON.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Body is JSON but not a valid notification.
    #[error("validation failed: {} error(s)", .0.len())]
    Validation(Vec<FieldError>),
}

#[derive(Debug, Serialize)]
struct ErrorResponse<T: Serialize> {
    detail: T,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => {
                tracing::warn!(error = %msg, "invalid_json");
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { detail: msg })).into_response()
            }
            Self::Validation(errors) => {
                tracing::warn!(errors = ?errors, "validation_failed");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ErrorResponse { detail: errors }),
                )
                    .into_response()
            }
        }
    }
}
