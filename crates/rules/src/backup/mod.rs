//! Backup plan suggestion, registration and activation.
//!
//! Activation walks a flight's unactivated plans in ascending priority and
//! activates the first one that passes the validation gate. Later candidates are
//! not tried once one succeeds. The three writes (plan flag, flight
//! rewrite, resolution alert) go through [`Store::commit_activation`]; a
//! failure part-way is reported as [`ActivationError::Partial`] with the
//! failing step and the steps already persisted.

mod validation;


use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use charterops_core::{
    Alert, AlertKind, BackupPlan, BackupPlanDraft, BackupPlanId, CrewId, Flight, FlightId,
    FlightStatus, NewAlert, ReferenceData,
};
use charterops_storage::{ActivationCommit, CommitError, Store, StoreError};

use crate::audit_log::{AuditLog, LogLevel, Phase};
use crate::duty::{DutyError, DutyTracker};

pub use validation::CandidateValidation;
use validation::validate_candidate;

/// Number of crew a suggested plan carries.
pub const SUGGESTED_CREW_SIZE: usize = 2;

#[derive(Error, Debug)]
pub enum ActivationError {
    #[error("flight not found: {0}")]
    FlightNotFound(FlightId),

    #[error("backup plan not found: {0}")]
    PlanNotFound(BackupPlanId),

    #[error("invalid backup plan: {0}")]
    InvalidPlan(String),

    #[error("no available backup plans")]
    NoAvailablePlans,

    #[error("no backup plan could be activated: {}", .errors.join("; "))]
    Exhausted { errors: Vec<String> },

    #[error("partial activation: {0}")]
    Partial(#[from] CommitError),

    #[error(transparent)]
    Duty(#[from] DutyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A successful activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationOutcome {
    pub flight_id: FlightId,
    pub backup_id: BackupPlanId,
    pub crew_ids: Vec<CrewId>,
    pub aircraft_id: String,
    pub fallback_airport: Option<String>,
    pub alert: Alert,
    /// Crew listed on the plan but left out of the activation.
    pub dropped_crew: Vec<String>,
    /// Errors from higher-priority candidates that were rejected first.
    pub rejected: Vec<String>,
    /// Post-commit crew reassignment problems.
    pub warnings: Vec<String>,
}

pub struct BackupResolver {
    store: Arc<dyn Store>,
    duty: Arc<DutyTracker>,
    reference: Arc<ReferenceData>,
    audit: Arc<AuditLog>,
}

impl BackupResolver {
    pub fn new(
        store: Arc<dyn Store>,
        duty: Arc<DutyTracker>,
        reference: Arc<ReferenceData>,
    ) -> Self {
        Self {
            store,
            duty,
            reference,
            audit: Arc::new(AuditLog::new()),
        }
    }

    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    async fn flight(&self, flight_id: FlightId) -> Result<Flight, ActivationError> {
        self.store
            .get_flight(flight_id)
            .await?
            .ok_or(ActivationError::FlightNotFound(flight_id))
    }

    // ── Suggestions ──────────────────────────────────────────

    /// Ranked candidate plans for `flight_id`, not persisted.
    ///
    /// Empty when fewer than two available crew (excluding the flight's own
    /// crew) exist.
    pub async fn suggest_plans(
        &self,
        flight_id: FlightId,
    ) -> Result<Vec<BackupPlanDraft>, ActivationError> {
        let flight = self.flight(flight_id).await?;
        let crew_ids: Vec<CrewId> = self
            .duty
            .available_crew()
            .await?
            .into_iter()
            .filter(|c| !flight.crew_ids.contains(&c.id))
            .take(SUGGESTED_CREW_SIZE)
            .map(|c| c.id)
            .collect();
        if crew_ids.len() < SUGGESTED_CREW_SIZE {
            return Ok(Vec::new());
        }

        let mut drafts = vec![BackupPlanDraft {
            crew_ids: crew_ids.clone(),
            aircraft_id: flight.tail_number.clone(),
            fallback_airport: None,
            priority: Some(1),
            rationale: Some("Original aircraft with alternate compliant crew".to_string()),
        }];

        if let Some(aircraft) = self
            .reference
            .available_aircraft
            .iter()
            .find(|a| **a != flight.tail_number)
        {
            drafts.push(BackupPlanDraft {
                crew_ids: crew_ids.clone(),
                aircraft_id: aircraft.clone(),
                fallback_airport: None,
                priority: Some(2),
                rationale: Some(format!("Backup aircraft {aircraft} on the same route")),
            });
        }

        if let Some(airport) = self
            .reference
            .alternate_airports
            .iter()
            .find(|a| **a != flight.destination)
        {
            drafts.push(BackupPlanDraft {
                crew_ids,
                aircraft_id: flight.tail_number.clone(),
                fallback_airport: Some(airport.clone()),
                priority: Some(3),
                rationale: Some(format!("Alternative airport {airport}")),
            });
        }

        self.audit.log(
            flight_id,
            LogLevel::Debug,
            Phase::Suggestion,
            format!("{} backup options suggested", drafts.len()),
        );
        Ok(drafts)
    }

    // ── Registration ─────────────────────────────────────────

    pub async fn create_plan(
        &self,
        flight_id: FlightId,
        draft: BackupPlanDraft,
    ) -> Result<BackupPlan, ActivationError> {
        self.create_plan_at(flight_id, draft, Utc::now()).await
    }

    pub async fn create_plan_at(
        &self,
        flight_id: FlightId,
        draft: BackupPlanDraft,
        now: DateTime<Utc>,
    ) -> Result<BackupPlan, ActivationError> {
        self.flight(flight_id).await?;
        if draft.aircraft_id.trim().is_empty() {
            return Err(ActivationError::InvalidPlan(
                "aircraft_id is required".to_string(),
            ));
        }
        let plan = self
            .store
            .insert_backup(draft.into_plan(flight_id, now))
            .await?;
        info!(
            flight_id = %flight_id,
            backup_id = %plan.id,
            priority = plan.priority,
            "backup plan registered"
        );
        Ok(plan)
    }

    /// Plans for a flight in ascending priority.
    pub async fn get_plans(&self, flight_id: FlightId) -> Result<Vec<BackupPlan>, ActivationError> {
        self.flight(flight_id).await?;
        Ok(self.store.backups_for_flight(flight_id).await?)
    }

    /// Run the validation gate for one plan without activating it.
    pub async fn validate_plan(
        &self,
        plan: &BackupPlan,
    ) -> Result<CandidateValidation, ActivationError> {
        let validation = validate_candidate(
            plan,
            self.store.as_ref(),
            &self.duty,
            &self.reference,
            Utc::now(),
        )
        .await?;
        Ok(validation)
    }

    // ── Activation ───────────────────────────────────────────

    pub async fn activate(
        &self,
        flight_id: FlightId,
        backup_id: Option<BackupPlanId>,
    ) -> Result<ActivationOutcome, ActivationError> {
        self.activate_at(flight_id, backup_id, Utc::now()).await
    }

    /// Activate `backup_id`, or the first valid unactivated plan by priority.
    pub async fn activate_at(
        &self,
        flight_id: FlightId,
        backup_id: Option<BackupPlanId>,
        now: DateTime<Utc>,
    ) -> Result<ActivationOutcome, ActivationError> {
        let flight = self.flight(flight_id).await?;
        let candidates = self.candidates(flight_id, backup_id).await?;
        if candidates.is_empty() {
            return Err(ActivationError::NoAvailablePlans);
        }

        let mut rejected = Vec::new();
        for plan in candidates {
            let validation =
                validate_candidate(&plan, self.store.as_ref(), &self.duty, &self.reference, now)
                    .await?;
            if !validation.is_valid() {
                let reason = format!(
                    "plan priority {}: {}",
                    plan.priority,
                    validation.failures.join(", ")
                );
                warn!(
                    flight_id = %flight_id,
                    backup_id = %plan.id,
                    reason = %reason,
                    "backup candidate rejected"
                );
                self.audit
                    .log(flight_id, LogLevel::Warning, Phase::Validation, reason.clone());
                rejected.push(reason);
                continue;
            }
            return self.commit(&flight, plan, validation, rejected, now).await;
        }

        Err(ActivationError::Exhausted { errors: rejected })
    }

    async fn candidates(
        &self,
        flight_id: FlightId,
        backup_id: Option<BackupPlanId>,
    ) -> Result<Vec<BackupPlan>, ActivationError> {
        match backup_id {
            Some(id) => {
                let plan = self
                    .store
                    .get_backup(id)
                    .await?
                    .filter(|p| p.flight_id == flight_id)
                    .ok_or(ActivationError::PlanNotFound(id))?;
                Ok(if plan.activated { Vec::new() } else { vec![plan] })
            }
            None => Ok(self
                .store
                .backups_for_flight(flight_id)
                .await?
                .into_iter()
                .filter(|p| !p.activated)
                .collect()),
        }
    }

    async fn commit(
        &self,
        flight: &Flight,
        plan: BackupPlan,
        validation: CandidateValidation,
        rejected: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<ActivationOutcome, ActivationError> {
        let crew_ids: Vec<CrewId> = validation.crew.iter().map(|c| c.id).collect();

        let mut rewritten = flight.clone();
        rewritten.crew_ids = crew_ids.clone();
        if let Some(airport) = &plan.fallback_airport {
            rewritten.destination = airport.clone();
        }
        rewritten.status = FlightStatus::Scheduled;

        let message = format!(
            "Backup plan activated: {} with crew {}",
            plan.aircraft_id,
            validation.crew_names().join(", ")
        );
        let commit = ActivationCommit {
            backup_id: plan.id,
            flight: rewritten,
            alert: NewAlert::new(flight.id, AlertKind::Advisory, message),
            at: now,
        };

        let alert = match self.store.commit_activation(&commit).await {
            Ok(alert) => alert,
            Err(e) => {
                warn!(
                    flight_id = %flight.id,
                    backup_id = %plan.id,
                    step = %e.step,
                    error = %e.source,
                    "activation write failed"
                );
                self.audit.log_with_details(
                    flight.id,
                    LogLevel::Error,
                    Phase::Activation,
                    e.to_string(),
                    Some(serde_json::json!({
                        "backup_id": plan.id,
                        "failed_step": e.step.to_string(),
                        "completed": e.completed.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    })),
                );
                return Err(ActivationError::Partial(e));
            }
        };

        let mut warnings = Vec::new();
        for member in &validation.crew {
            let mut member = member.clone();
            member.assigned_flight = Some(flight.id);
            if let Err(e) = self.store.update_crew(&member).await {
                warn!(crew_id = %member.id, error = %e, "crew reassignment failed");
                warnings.push(format!("{}: reassignment failed: {e}", member.name));
            }
        }

        info!(
            flight_id = %flight.id,
            backup_id = %plan.id,
            aircraft = %plan.aircraft_id,
            crew = crew_ids.len(),
            "backup plan activated"
        );
        self.audit
            .log(flight.id, LogLevel::Info, Phase::Activation, alert.message.clone());

        Ok(ActivationOutcome {
            flight_id: flight.id,
            backup_id: plan.id,
            crew_ids,
            aircraft_id: plan.aircraft_id,
            fallback_airport: plan.fallback_airport,
            alert,
            dropped_crew: validation.dropped,
            rejected,
            warnings,
        })
    }
}
