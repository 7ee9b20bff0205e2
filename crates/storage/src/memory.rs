//! In-memory [`Store`] backend.
//!
//! Tables are `IndexMap`s (insertion order preserved) behind a single
//! `std::sync::RwLock`, so every trait method is a short critical section
//! with no `.await` held across the lock. Activation commits are applied
//! under one write guard unless the store is built with
//! [`MemoryStore::non_transactional`].
//!
//! Tests can make individual operations fail with
//! [`MemoryStore::inject_failure`].

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use charterops_core::{
    Alert, AlertId, BackupPlan, BackupPlanId, CrewId, CrewMember, DutyRecord, DutyRecordId,
    Flight, FlightId, FlightStatus, NewAlert, RecordKind,
};

use crate::error::StoreError;
use crate::store::{
    commit_sequentially, ActivationCommit, ActivationStep, AlertFilter, CommitError, Store,
};

/// Store operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListFlights,
    GetFlight,
    InsertFlight,
    UpdateFlight,
    ListCrew,
    GetCrew,
    InsertCrew,
    UpdateCrew,
    InsertDutyRecord,
    UpdateDutyRecord,
    ListDutyRecords,
    ListAlerts,
    GetAlert,
    InsertAlert,
    ResolveAlert,
    InsertBackup,
    GetBackup,
    ListBackups,
    ActivateBackup,
}

#[derive(Default)]
struct Tables {
    flights: IndexMap<FlightId, Flight>,
    crew: IndexMap<CrewId, CrewMember>,
    duty_records: IndexMap<DutyRecordId, DutyRecord>,
    alerts: IndexMap<AlertId, Alert>,
    backups: IndexMap<BackupPlanId, BackupPlan>,
}

impl Tables {
    fn has_open_alert(&self, alert: &NewAlert) -> bool {
        self.alerts
            .values()
            .any(|a| !a.resolved && a.flight_id == alert.flight_id && a.kind == alert.kind)
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    failures: RwLock<HashSet<StoreOp>>,
    transactional: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            failures: RwLock::new(HashSet::new()),
            transactional: true,
        }
    }

    /// A store whose activation commit runs as three independent writes,
    /// like a backend without transactions.
    pub fn non_transactional() -> Self {
        Self {
            transactional: false,
            ..Self::new()
        }
    }

    /// Make every subsequent call of `op` fail with `Unavailable`.
    pub fn inject_failure(&self, op: StoreOp) {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert(op);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.write() {
            failures.clear();
        }
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        let failures = self
            .failures
            .read()
            .map_err(|_| StoreError::Unavailable("failure table poisoned".into()))?;
        if failures.contains(&op) {
            debug!(?op, "injected store failure");
            return Err(StoreError::Unavailable(format!("injected failure on {op:?}")));
        }
        Ok(())
    }

    fn read(&self, op: StoreOp) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.check(op)?;
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn write(&self, op: StoreOp) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.check(op)?;
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn commit_atomically(&self, commit: &ActivationCommit) -> Result<Alert, CommitError> {
        let fail = |step, source| CommitError {
            step,
            completed: Vec::new(),
            source,
        };

        // Validate every step before touching any table.
        self.check(StoreOp::ActivateBackup)
            .map_err(|e| fail(ActivationStep::PlanFlag, e))?;
        self.check(StoreOp::UpdateFlight)
            .map_err(|e| fail(ActivationStep::FlightUpdate, e))?;
        self.check(StoreOp::InsertAlert)
            .map_err(|e| fail(ActivationStep::AlertInsert, e))?;

        let mut tables = self.tables.write().map_err(|_| {
            fail(
                ActivationStep::PlanFlag,
                StoreError::Unavailable("store lock poisoned".into()),
            )
        })?;

        if !tables.backups.contains_key(&commit.backup_id) {
            return Err(fail(
                ActivationStep::PlanFlag,
                StoreError::not_found(RecordKind::BackupPlan, commit.backup_id),
            ));
        }
        if !tables.flights.contains_key(&commit.flight.id) {
            return Err(fail(
                ActivationStep::FlightUpdate,
                StoreError::not_found(RecordKind::Flight, commit.flight.id),
            ));
        }

        if let Some(plan) = tables.backups.get_mut(&commit.backup_id) {
            plan.activated = true;
            plan.activated_at = Some(commit.at);
        }
        tables
            .flights
            .insert(commit.flight.id, commit.flight.clone());
        let alert = commit.alert.clone().into_alert(commit.at);
        tables.alerts.insert(alert.id, alert.clone());
        Ok(alert)
    }
}

#[async_trait]
impl Store for MemoryStore {
    // ── Flights ──────────────────────────────────────────────

    async fn list_flights(&self, statuses: &[FlightStatus]) -> Result<Vec<Flight>, StoreError> {
        let tables = self.read(StoreOp::ListFlights)?;
        let mut flights: Vec<Flight> = tables
            .flights
            .values()
            .filter(|f| statuses.is_empty() || statuses.contains(&f.status))
            .cloned()
            .collect();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn get_flight(&self, id: FlightId) -> Result<Option<Flight>, StoreError> {
        Ok(self.read(StoreOp::GetFlight)?.flights.get(&id).cloned())
    }

    async fn insert_flight(&self, flight: Flight) -> Result<Flight, StoreError> {
        let mut tables = self.write(StoreOp::InsertFlight)?;
        if tables.flights.contains_key(&flight.id) {
            return Err(StoreError::Conflict(format!("flight {} exists", flight.id)));
        }
        tables.flights.insert(flight.id, flight.clone());
        Ok(flight)
    }

    async fn update_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        let mut tables = self.write(StoreOp::UpdateFlight)?;
        match tables.flights.get_mut(&flight.id) {
            Some(row) => {
                *row = flight.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(RecordKind::Flight, flight.id)),
        }
    }

    // ── Crew ─────────────────────────────────────────────────

    async fn list_crew(&self) -> Result<Vec<CrewMember>, StoreError> {
        Ok(self
            .read(StoreOp::ListCrew)?
            .crew
            .values()
            .cloned()
            .collect())
    }

    async fn get_crew(&self, id: CrewId) -> Result<Option<CrewMember>, StoreError> {
        Ok(self.read(StoreOp::GetCrew)?.crew.get(&id).cloned())
    }

    async fn insert_crew(&self, crew: CrewMember) -> Result<CrewMember, StoreError> {
        let mut tables = self.write(StoreOp::InsertCrew)?;
        if tables.crew.contains_key(&crew.id) {
            return Err(StoreError::Conflict(format!("crew {} exists", crew.id)));
        }
        tables.crew.insert(crew.id, crew.clone());
        Ok(crew)
    }

    async fn update_crew(&self, crew: &CrewMember) -> Result<(), StoreError> {
        let mut tables = self.write(StoreOp::UpdateCrew)?;
        match tables.crew.get_mut(&crew.id) {
            Some(row) => {
                *row = crew.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(RecordKind::Crew, crew.id)),
        }
    }

    // ── Duty records ─────────────────────────────────────────

    async fn insert_duty_record(&self, record: DutyRecord) -> Result<DutyRecord, StoreError> {
        let mut tables = self.write(StoreOp::InsertDutyRecord)?;
        tables.duty_records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_duty_record(&self, record: &DutyRecord) -> Result<(), StoreError> {
        let mut tables = self.write(StoreOp::UpdateDutyRecord)?;
        match tables.duty_records.get_mut(&record.id) {
            Some(row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(RecordKind::DutyRecord, record.id)),
        }
    }

    async fn duty_records(
        &self,
        crew_id: CrewId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DutyRecord>, StoreError> {
        let tables = self.read(StoreOp::ListDutyRecords)?;
        let mut records: Vec<DutyRecord> = tables
            .duty_records
            .values()
            .filter(|r| r.crew_id == crew_id)
            .filter(|r| since.map_or(true, |s| r.start_time >= s))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.start_time);
        Ok(records)
    }

    async fn latest_rest_record(&self, crew_id: CrewId) -> Result<Option<DutyRecord>, StoreError> {
        let tables = self.read(StoreOp::ListDutyRecords)?;
        // Later insertions win ties on rest_start.
        Ok(tables
            .duty_records
            .values()
            .filter(|r| r.crew_id == crew_id)
            .filter_map(|r| r.rest_start.map(|start| (start, r)))
            .max_by_key(|(start, _)| *start)
            .map(|(_, r)| r.clone()))
    }

    // ── Alerts ───────────────────────────────────────────────

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        let tables = self.read(StoreOp::ListAlerts)?;
        // Reverse insertion order first so equal timestamps list newest-inserted first.
        let mut alerts: Vec<Alert> = tables
            .alerts
            .values()
            .rev()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
        Ok(alerts)
    }

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, StoreError> {
        Ok(self.read(StoreOp::GetAlert)?.alerts.get(&id).cloned())
    }

    async fn insert_alert(&self, alert: NewAlert, at: DateTime<Utc>) -> Result<Alert, StoreError> {
        let mut tables = self.write(StoreOp::InsertAlert)?;
        let alert = alert.into_alert(at);
        tables.alerts.insert(alert.id, alert.clone());
        Ok(alert)
    }

    async fn insert_alert_if_absent(
        &self,
        alert: NewAlert,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError> {
        let mut tables = self.write(StoreOp::InsertAlert)?;
        if tables.has_open_alert(&alert) {
            return Ok(None);
        }
        let alert = alert.into_alert(at);
        tables.alerts.insert(alert.id, alert.clone());
        Ok(Some(alert))
    }

    async fn set_alert_resolved(&self, id: AlertId, resolved: bool) -> Result<(), StoreError> {
        let mut tables = self.write(StoreOp::ResolveAlert)?;
        match tables.alerts.get_mut(&id) {
            Some(alert) => {
                alert.resolved = resolved;
                Ok(())
            }
            None => Err(StoreError::not_found(RecordKind::Alert, id)),
        }
    }

    // ── Backup plans ─────────────────────────────────────────

    async fn insert_backup(&self, plan: BackupPlan) -> Result<BackupPlan, StoreError> {
        let mut tables = self.write(StoreOp::InsertBackup)?;
        tables.backups.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn get_backup(&self, id: BackupPlanId) -> Result<Option<BackupPlan>, StoreError> {
        Ok(self.read(StoreOp::GetBackup)?.backups.get(&id).cloned())
    }

    async fn backups_for_flight(&self, flight_id: FlightId) -> Result<Vec<BackupPlan>, StoreError> {
        let tables = self.read(StoreOp::ListBackups)?;
        let mut plans: Vec<BackupPlan> = tables
            .backups
            .values()
            .filter(|p| p.flight_id == flight_id)
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.priority);
        Ok(plans)
    }

    async fn mark_backup_activated(
        &self,
        id: BackupPlanId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.write(StoreOp::ActivateBackup)?;
        match tables.backups.get_mut(&id) {
            Some(plan) => {
                plan.activated = true;
                plan.activated_at = Some(at);
                Ok(())
            }
            None => Err(StoreError::not_found(RecordKind::BackupPlan, id)),
        }
    }

    // ── Activation ───────────────────────────────────────────

    async fn commit_activation(&self, commit: &ActivationCommit) -> Result<Alert, CommitError> {
        if self.transactional {
            self.commit_atomically(commit)
        } else {
            commit_sequentially(self, commit).await
        }
    }
}
