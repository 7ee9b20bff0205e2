//! Crew duty and rest endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use charterops_core::{CrewId, CrewMember, DutyRecord, FlightId};
use charterops_rules::{ComplianceReport, RestOutcome};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn compliance(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<CrewId>,
) -> Result<Json<ComplianceReport>, ApiError> {
    Ok(Json(state.monitor.duty().compliance_check(crew_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct DutyUpdate {
    pub hours: f64,
    #[serde(default)]
    pub flight_id: Option<FlightId>,
}

pub async fn update_duty(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<CrewId>,
    Json(update): Json<DutyUpdate>,
) -> Result<Json<CrewMember>, ApiError> {
    let crew = state
        .monitor
        .duty()
        .update_duty(crew_id, update.flight_id, update.hours)
        .await?;
    Ok(Json(crew))
}

pub async fn start_rest(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<CrewId>,
) -> Result<Json<DutyRecord>, ApiError> {
    Ok(Json(state.monitor.duty().start_rest(crew_id).await?))
}

pub async fn end_rest(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<CrewId>,
) -> Result<Json<RestOutcome>, ApiError> {
    Ok(Json(state.monitor.duty().end_rest(crew_id).await?))
}
