//! Route definitions and handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::notification::Notification;
use crate::state::AppState;

/// Build the ingestor router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ingest", post(ingest))
        .with_state(state)
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Acceptance response.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedResponse {
    status: &'static str,
    id: String,
}

/// Accept one notification.
///
/// The body is read as JSON whatever the declared content type.
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        state.record_rejected();
        ApiError::BadRequest(format!("body is not valid JSON: {}", e))
    })?;

    let notification = Notification::validate(&value).map_err(|errors| {
        state.record_rejected();
        ApiError::Validation(errors)
    })?;

    state.record_accepted();
    tracing::info!(
        id = %notification.id,
        record = %notification.record(),
        "ingested_notification"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted",
            id: notification.id,
        }),
    ))
}
