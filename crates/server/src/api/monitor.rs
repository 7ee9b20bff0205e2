//! Health and monitor lifecycle endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use charterops_monitor::{CheckReport, FlightSummary, MonitorStatus};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub profile: String,
    pub monitoring: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        profile: state.config.profile_label().to_string(),
        monitoring: state.monitor.is_running(),
    })
}

/// Lifecycle call result: whether the call changed anything.
#[derive(Serialize)]
pub struct LifecycleResponse {
    pub running: bool,
    pub changed: bool,
}

pub async fn start(State(state): State<Arc<AppState>>) -> Json<LifecycleResponse> {
    let changed = state.monitor.start();
    Json(LifecycleResponse {
        running: state.monitor.is_running(),
        changed,
    })
}

pub async fn stop(State(state): State<Arc<AppState>>) -> Json<LifecycleResponse> {
    let changed = state.monitor.stop();
    Json(LifecycleResponse {
        running: state.monitor.is_running(),
        changed,
    })
}

pub async fn check(State(state): State<Arc<AppState>>) -> Result<Json<CheckReport>, ApiError> {
    Ok(Json(state.monitor.trigger_check().await?))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<MonitorStatus>, ApiError> {
    Ok(Json(state.monitor.status().await?))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FlightSummary>>, ApiError> {
    Ok(Json(state.monitor.summary().await?))
}
