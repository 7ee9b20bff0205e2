//! Alert ingestion and resolution.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use charterops_core::{Alert, AlertId, NewAlert};

use crate::error::ApiError;
use crate::state::AppState;

/// Ingest an externally reported alert (e.g. a mechanical write-up).
pub async fn submit_alert(
    State(state): State<Arc<AppState>>,
    Json(alert): Json<NewAlert>,
) -> Result<(StatusCode, Json<Alert>), ApiError> {
    if alert.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    let created = state.monitor.detector().submit_alert(alert).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<AlertId>,
) -> Result<Json<Alert>, ApiError> {
    Ok(Json(state.monitor.resolve_alert(alert_id).await?))
}
