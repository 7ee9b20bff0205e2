//! Crew duty and rest compliance.
//!
//! The [`DutyTracker`] derives duty hours and rest compliance from the
//! append-only duty record log. `CrewMember.current_duty` and
//! `CrewMember.rest_compliant` are caches the tracker writes; the records
//! are authoritative.
//!
//! Each crew member moves between two states:
//!
//! ```text
//! On-Duty --start_rest--> Resting --end_rest--> On-Duty
//! ```
//!
//! A crew member with an open rest record reads as resting (and not rest
//! compliant) from every concurrent caller.

mod report;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info};

use charterops_core::{hours_between, CrewId, CrewMember, DutyRecord, Flight, FlightId};
use charterops_storage::{Store, StoreError};

pub use report::{
    ComplianceReport, DutyState, RestOutcome, Violation, APPROACH_MARGIN_HOURS,
    AVAILABLE_DUTY_CEILING, MAX_DUTY_HOURS, MIN_REST_HOURS,
};
use report::{assess, RestStatus};

#[derive(Error, Debug)]
pub enum DutyError {
    #[error("crew not found: {0}")]
    CrewNotFound(CrewId),

    #[error("invalid duty update: {0}")]
    Validation(String),

    #[error("crew {0} is already resting")]
    AlreadyResting(CrewId),

    #[error("crew {0} has no open rest period")]
    NotResting(CrewId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct DutyTracker {
    store: Arc<dyn Store>,
    window: Duration,
}

impl DutyTracker {
    /// Tracker with the default 24 hour duty window.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            window: Duration::hours(24),
        }
    }

    pub fn with_window_hours(mut self, hours: u32) -> Self {
        self.window = Duration::hours(i64::from(hours));
        self
    }

    async fn crew(&self, crew_id: CrewId) -> Result<CrewMember, DutyError> {
        self.store
            .get_crew(crew_id)
            .await?
            .ok_or(DutyError::CrewNotFound(crew_id))
    }

    async fn rest_status(&self, crew_id: CrewId) -> Result<RestStatus, DutyError> {
        let status = match self.store.latest_rest_record(crew_id).await? {
            None => RestStatus::Never,
            Some(record) => match (record.rest_start, record.rest_end) {
                (Some(since), None) => RestStatus::Resting { since },
                (Some(start), Some(end)) => RestStatus::Completed {
                    hours: record.rest_hours.unwrap_or_else(|| hours_between(start, end)),
                },
                _ => RestStatus::Never,
            },
        };
        Ok(status)
    }

    // ── Queries ──────────────────────────────────────────────

    pub async fn duty_hours(&self, crew_id: CrewId) -> Result<f64, DutyError> {
        self.duty_hours_at(crew_id, Utc::now()).await
    }

    /// Duty hours of the records starting in the trailing window ending at
    /// `now`. Rest periods never count as duty.
    pub async fn duty_hours_at(&self, crew_id: CrewId, now: DateTime<Utc>) -> Result<f64, DutyError> {
        let records = self
            .store
            .duty_records(crew_id, now.checked_sub_signed(self.window))
            .await?;
        Ok(records
            .iter()
            .filter(|r| !r.is_rest() && r.start_time <= now)
            .map(|r| r.duty_hours)
            .filter(|h| *h > 0.0)
            .sum())
    }

    /// True when the latest rest period is completed and long enough.
    pub async fn rest_compliant(&self, crew_id: CrewId) -> Result<bool, DutyError> {
        Ok(self.rest_status(crew_id).await?.is_compliant())
    }

    pub async fn duty_state(&self, crew_id: CrewId) -> Result<DutyState, DutyError> {
        Ok(match self.rest_status(crew_id).await? {
            RestStatus::Resting { since } => DutyState::Resting { since },
            _ => DutyState::OnDuty,
        })
    }

    pub async fn compliance_check(&self, crew_id: CrewId) -> Result<ComplianceReport, DutyError> {
        self.compliance_check_at(crew_id, Utc::now()).await
    }

    pub async fn compliance_check_at(
        &self,
        crew_id: CrewId,
        now: DateTime<Utc>,
    ) -> Result<ComplianceReport, DutyError> {
        let crew = self.crew(crew_id).await?;
        let duty_hours = self.duty_hours_at(crew_id, now).await?;
        let rest = self.rest_status(crew_id).await?;
        let (violations, warnings) = assess(duty_hours, &rest);

        Ok(ComplianceReport {
            crew_id,
            crew_name: crew.name,
            is_compliant: violations.is_empty(),
            duty_hours,
            rest_compliant: rest.is_compliant(),
            rest_hours_required: MIN_REST_HOURS,
            rest_hours_actual: rest.completed_hours(),
            violations,
            warnings,
        })
    }

    /// One report per crew member assigned to `flight`. Unknown crew ids are skipped.
    pub async fn flight_compliance(&self, flight: &Flight) -> Result<Vec<ComplianceReport>, DutyError> {
        self.flight_compliance_at(flight, Utc::now()).await
    }

    pub async fn flight_compliance_at(
        &self,
        flight: &Flight,
        now: DateTime<Utc>,
    ) -> Result<Vec<ComplianceReport>, DutyError> {
        let mut reports = Vec::with_capacity(flight.crew_ids.len());
        for crew_id in &flight.crew_ids {
            match self.compliance_check_at(*crew_id, now).await {
                Ok(report) => reports.push(report),
                Err(DutyError::CrewNotFound(id)) => {
                    debug!(flight_id = %flight.id, crew_id = %id, "assigned crew member missing");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(reports)
    }

    /// Crew with a compliant rest cache and duty below the approach margin.
    pub async fn available_crew(&self) -> Result<Vec<CrewMember>, DutyError> {
        Ok(self
            .store
            .list_crew()
            .await?
            .into_iter()
            .filter(|c| c.rest_compliant && c.current_duty < AVAILABLE_DUTY_CEILING)
            .collect())
    }

    // ── State transitions ────────────────────────────────────

    pub async fn start_rest(&self, crew_id: CrewId) -> Result<DutyRecord, DutyError> {
        self.start_rest_at(crew_id, Utc::now()).await
    }

    /// Open a rest period at `now`. Clears the flight assignment.
    pub async fn start_rest_at(
        &self,
        crew_id: CrewId,
        now: DateTime<Utc>,
    ) -> Result<DutyRecord, DutyError> {
        let mut crew = self.crew(crew_id).await?;
        if let RestStatus::Resting { .. } = self.rest_status(crew_id).await? {
            return Err(DutyError::AlreadyResting(crew_id));
        }

        let record = self
            .store
            .insert_duty_record(DutyRecord::open_rest(crew_id, now))
            .await?;

        crew.rest_compliant = false;
        crew.assigned_flight = None;
        self.store.update_crew(&crew).await?;

        info!(crew_id = %crew_id, "rest period started");
        Ok(record)
    }

    pub async fn end_rest(&self, crew_id: CrewId) -> Result<RestOutcome, DutyError> {
        self.end_rest_at(crew_id, Utc::now()).await
    }

    /// Close the open rest period at `now` and reset duty to zero.
    pub async fn end_rest_at(
        &self,
        crew_id: CrewId,
        now: DateTime<Utc>,
    ) -> Result<RestOutcome, DutyError> {
        let mut crew = self.crew(crew_id).await?;
        let mut record = match self.store.latest_rest_record(crew_id).await? {
            Some(record) if record.is_open_rest() => record,
            _ => return Err(DutyError::NotResting(crew_id)),
        };

        let start = record.rest_start.unwrap_or(record.start_time);
        let rest_hours = hours_between(start, now);
        record.rest_end = Some(now);
        record.rest_hours = Some(rest_hours);
        record.end_time = now;
        self.store.update_duty_record(&record).await?;

        let rest_compliant = rest_hours >= MIN_REST_HOURS;
        crew.rest_compliant = rest_compliant;
        crew.current_duty = 0.0;
        self.store.update_crew(&crew).await?;

        info!(crew_id = %crew_id, rest_hours, rest_compliant, "rest period ended");
        Ok(RestOutcome {
            rest_hours,
            rest_compliant,
        })
    }

    pub async fn update_duty(
        &self,
        crew_id: CrewId,
        flight_id: Option<FlightId>,
        hours: f64,
    ) -> Result<CrewMember, DutyError> {
        self.update_duty_at(crew_id, flight_id, hours, Utc::now()).await
    }

    /// Log a duty block of `hours` reported at `now` and refresh the crew
    /// cache from the derived window total.
    ///
    /// Only sign and finiteness are validated; totals above the maximum are
    /// stored and show up at the next compliance check.
    pub async fn update_duty_at(
        &self,
        crew_id: CrewId,
        flight_id: Option<FlightId>,
        hours: f64,
        now: DateTime<Utc>,
    ) -> Result<CrewMember, DutyError> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(DutyError::Validation(format!(
                "duty hours must be a non-negative number, got {hours}"
            )));
        }
        let mut crew = self.crew(crew_id).await?;

        self.store
            .insert_duty_record(DutyRecord::reported(crew_id, flight_id, now, hours))
            .await?;

        crew.current_duty = self.duty_hours_at(crew_id, now).await?;
        crew.rest_compliant = self.rest_compliant(crew_id).await?;
        if flight_id.is_some() {
            crew.assigned_flight = flight_id;
        }
        self.store.update_crew(&crew).await?;

        debug!(crew_id = %crew_id, hours, total = crew.current_duty, "duty updated");
        Ok(crew)
    }

    pub async fn refresh(&self, crew_id: CrewId) -> Result<ComplianceReport, DutyError> {
        self.refresh_at(crew_id, Utc::now()).await
    }

    /// Run a compliance check and, if it fails, write the derived duty and
    /// rest values back into the crew cache.
    pub async fn refresh_at(
        &self,
        crew_id: CrewId,
        now: DateTime<Utc>,
    ) -> Result<ComplianceReport, DutyError> {
        let report = self.compliance_check_at(crew_id, now).await?;
        if !report.is_compliant {
            let mut crew = self.crew(crew_id).await?;
            if crew.current_duty != report.duty_hours || crew.rest_compliant != report.rest_compliant
            {
                crew.current_duty = report.duty_hours;
                crew.rest_compliant = report.rest_compliant;
                self.store.update_crew(&crew).await?;
                debug!(crew_id = %crew_id, "crew cache refreshed from duty records");
            }
        }
        Ok(report)
    }
}
