//! Flight details and backup plan endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use charterops_core::{BackupPlan, BackupPlanDraft, BackupPlanId, FlightId};
use charterops_monitor::FlightDetails;
use charterops_rules::ActivationOutcome;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn flight_details(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<FlightId>,
) -> Result<Json<FlightDetails>, ApiError> {
    Ok(Json(state.monitor.flight_details(flight_id).await?))
}

pub async fn list_backups(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<FlightId>,
) -> Result<Json<Vec<BackupPlan>>, ApiError> {
    Ok(Json(state.monitor.backups().get_plans(flight_id).await?))
}

pub async fn create_backup(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<FlightId>,
    Json(draft): Json<BackupPlanDraft>,
) -> Result<(StatusCode, Json<BackupPlan>), ApiError> {
    let plan = state.monitor.backups().create_plan(flight_id, draft).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn suggest_backups(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<FlightId>,
) -> Result<Json<Vec<BackupPlanDraft>>, ApiError> {
    Ok(Json(state.monitor.backups().suggest_plans(flight_id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivateParams {
    /// Activate this plan instead of the best candidate.
    pub backup_id: Option<BackupPlanId>,
}

pub async fn activate_backup(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<FlightId>,
    Query(params): Query<ActivateParams>,
) -> Result<Json<ActivationOutcome>, ApiError> {
    let outcome = state
        .monitor
        .backups()
        .activate(flight_id, params.backup_id)
        .await?;
    Ok(Json(outcome))
}
