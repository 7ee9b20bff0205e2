//! [`Store`] trait: the query/command interface to the flight operations
//! database (flights, crew, duty_records, alerts, backups).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use charterops_core::{
    Alert, AlertId, AlertKind, BackupPlan, BackupPlanId, CrewId, CrewMember, DutyRecord, Flight,
    FlightId, FlightStatus, NewAlert,
};

use crate::error::StoreError;

/// Filter for alert reads. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertFilter {
    pub flight_id: Option<FlightId>,
    pub kind: Option<AlertKind>,
    pub resolved: Option<bool>,
}

impl AlertFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_flight(flight_id: FlightId) -> Self {
        Self {
            flight_id: Some(flight_id),
            ..Self::default()
        }
    }

    pub fn unresolved(mut self) -> Self {
        self.resolved = Some(false);
        self
    }

    pub fn of_kind(mut self, kind: AlertKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.flight_id.map_or(true, |f| alert.flight_id == f)
            && self.kind.map_or(true, |k| alert.kind == k)
            && self.resolved.map_or(true, |r| alert.resolved == r)
    }
}

/// The three writes that make up a backup activation, in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStep {
    /// `BackupPlan.activated = true`.
    PlanFlag,
    /// Flight crew (and destination) rewrite, status reset to scheduled.
    FlightUpdate,
    /// Resolution alert insert.
    AlertInsert,
}

impl std::fmt::Display for ActivationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationStep::PlanFlag => write!(f, "plan-flag"),
            ActivationStep::FlightUpdate => write!(f, "flight-update"),
            ActivationStep::AlertInsert => write!(f, "alert-insert"),
        }
    }
}

/// Everything a successful activation writes.
#[derive(Debug, Clone)]
pub struct ActivationCommit {
    pub backup_id: BackupPlanId,
    /// The flight row as it should read after activation.
    pub flight: Flight,
    pub alert: NewAlert,
    pub at: DateTime<Utc>,
}

/// An activation write sequence that stopped at `step`.
///
/// `completed` lists the steps already persisted; they are not undone.
#[derive(Debug, Clone, thiserror::Error)]
#[error("activation stopped at {step} (completed: {completed:?}): {source}")]
pub struct CommitError {
    pub step: ActivationStep,
    pub completed: Vec<ActivationStep>,
    pub source: StoreError,
}

/// Asynchronous access to the operations database.
///
/// Writes are last-write-wins; there is no per-record locking. The one
/// exception is [`insert_alert_if_absent`](Store::insert_alert_if_absent),
/// which implementations must make atomic (a uniqueness constraint on
/// `(flight_id, type)` over unresolved rows, or equivalent).
#[async_trait]
pub trait Store: Send + Sync {
    // ── Flights ──────────────────────────────────────────────

    /// Flights whose status is in `statuses` (all flights when empty),
    /// ordered by departure time.
    async fn list_flights(&self, statuses: &[FlightStatus]) -> Result<Vec<Flight>, StoreError>;

    async fn get_flight(&self, id: FlightId) -> Result<Option<Flight>, StoreError>;

    async fn insert_flight(&self, flight: Flight) -> Result<Flight, StoreError>;

    /// Replace the stored row. Fails with `NotFound` for unknown ids.
    async fn update_flight(&self, flight: &Flight) -> Result<(), StoreError>;

    /// Flights the detector and sweep watch (scheduled or delayed).
    async fn active_flights(&self) -> Result<Vec<Flight>, StoreError> {
        self.list_flights(&[FlightStatus::Scheduled, FlightStatus::Delayed])
            .await
    }

    // ── Crew ─────────────────────────────────────────────────

    async fn list_crew(&self) -> Result<Vec<CrewMember>, StoreError>;

    async fn get_crew(&self, id: CrewId) -> Result<Option<CrewMember>, StoreError>;

    async fn insert_crew(&self, crew: CrewMember) -> Result<CrewMember, StoreError>;

    async fn update_crew(&self, crew: &CrewMember) -> Result<(), StoreError>;

    // ── Duty records ─────────────────────────────────────────

    async fn insert_duty_record(&self, record: DutyRecord) -> Result<DutyRecord, StoreError>;

    async fn update_duty_record(&self, record: &DutyRecord) -> Result<(), StoreError>;

    /// Records for `crew_id` whose start time is at or after `since`
    /// (all records when `None`), ordered by start time ascending.
    async fn duty_records(
        &self,
        crew_id: CrewId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DutyRecord>, StoreError>;

    /// The record with the latest `rest_start` for `crew_id`, open or not.
    async fn latest_rest_record(&self, crew_id: CrewId) -> Result<Option<DutyRecord>, StoreError>;

    // ── Alerts ───────────────────────────────────────────────

    /// Alerts matching `filter`, newest first.
    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError>;

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, StoreError>;

    async fn insert_alert(&self, alert: NewAlert, at: DateTime<Utc>) -> Result<Alert, StoreError>;

    /// Insert unless an unresolved alert of the same `(flight_id, type)`
    /// exists. Returns `None` when the insert was skipped. Atomic.
    async fn insert_alert_if_absent(
        &self,
        alert: NewAlert,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError>;

    async fn set_alert_resolved(&self, id: AlertId, resolved: bool) -> Result<(), StoreError>;

    // ── Backup plans ─────────────────────────────────────────

    async fn insert_backup(&self, plan: BackupPlan) -> Result<BackupPlan, StoreError>;

    async fn get_backup(&self, id: BackupPlanId) -> Result<Option<BackupPlan>, StoreError>;

    /// Plans for a flight ordered by ascending priority.
    async fn backups_for_flight(&self, flight_id: FlightId) -> Result<Vec<BackupPlan>, StoreError>;

    async fn mark_backup_activated(
        &self,
        id: BackupPlanId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // ── Activation ───────────────────────────────────────────

    /// Persist an activation. The default runs the three writes in order
    /// and reports where it stopped; stores with transactions should
    /// override this to apply all-or-nothing.
    async fn commit_activation(&self, commit: &ActivationCommit) -> Result<Alert, CommitError> {
        commit_sequentially(self, commit).await
    }
}

/// Apply an activation as three independent writes, stopping at the
/// first failure. Earlier writes stay in place.
pub async fn commit_sequentially<S: Store + ?Sized>(
    store: &S,
    commit: &ActivationCommit,
) -> Result<Alert, CommitError> {
    let mut completed = Vec::with_capacity(3);

    store
        .mark_backup_activated(commit.backup_id, commit.at)
        .await
        .map_err(|source| CommitError {
            step: ActivationStep::PlanFlag,
            completed: completed.clone(),
            source,
        })?;
    completed.push(ActivationStep::PlanFlag);

    store
        .update_flight(&commit.flight)
        .await
        .map_err(|source| CommitError {
            step: ActivationStep::FlightUpdate,
            completed: completed.clone(),
            source,
        })?;
    completed.push(ActivationStep::FlightUpdate);

    store
        .insert_alert(commit.alert.clone(), commit.at)
        .await
        .map_err(|source| CommitError {
            step: ActivationStep::AlertInsert,
            completed,
            source,
        })
}
