//! [`DisruptionMonitor`]: lifecycle, comprehensive sweep and read APIs.
//!
//! The monitor drives two [`Ticker`]s. The detector ticker runs
//! [`DisruptionDetector::run_cycle`] on the fast cadence and hands newly
//! raised alerts to the notification [`Dispatcher`]. The sweep ticker runs
//! the comprehensive pass on the slow cadence: flights with an open
//! disruption alert and no registered plans get a backup-suggestion
//! advisory, and every assigned crew member's duty snapshot is refreshed.
//!
//! Both tickers fire immediately on start. Stopping only prevents future
//! ticks; a cycle already running completes.

mod tasks;

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use charterops_core::config::MonitorConfig;
use charterops_core::{Alert, AlertId, AlertKind, Flight, FlightId, NewAlert};
use charterops_notify::Dispatcher;
use charterops_rules::audit_log::{LogLevel, LogQuery, Phase};
use charterops_rules::detector::FlightFailure;
use charterops_rules::severity::{crew_violations, flight_severity};
use charterops_rules::{
    ActivationError, BackupResolver, DetectionReport, DetectorError, DisruptionDetector,
    DutyError, DutyTracker, Ticker,
};
use charterops_storage::{AlertFilter, Store, StoreError};

use crate::summary::{
    sort_summaries, CheckReport, FlightDetails, FlightSummary, MonitorStatus, SweepReport,
};
use tasks::{DetectionTask, SweepTask};

pub const DEFAULT_DETECTOR_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("flight not found: {0}")]
    FlightNotFound(FlightId),

    #[error("alert not found: {0}")]
    AlertNotFound(AlertId),

    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error(transparent)]
    Duty(#[from] DutyError),

    #[error(transparent)]
    Backup(#[from] ActivationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// State shared by the monitor and its periodic tasks.
pub(crate) struct MonitorCore {
    store: Arc<dyn Store>,
    detector: Arc<DisruptionDetector>,
    duty: Arc<DutyTracker>,
    backups: Arc<BackupResolver>,
    dispatcher: Arc<Dispatcher>,
    last_check: Mutex<Option<DateTime<Utc>>>,
}

impl MonitorCore {
    fn mark_checked(&self, at: DateTime<Utc>) {
        let mut last = self.last_check.lock().unwrap_or_else(PoisonError::into_inner);
        if last.map_or(true, |prev| at > prev) {
            *last = Some(at);
        }
    }

    fn last_check(&self) -> Option<DateTime<Utc>> {
        *self.last_check.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One detector cycle followed by notification of the new alerts.
    pub(crate) async fn detect(&self, now: DateTime<Utc>) -> Result<DetectionReport, MonitorError> {
        let report = self.detector.run_cycle_at(now).await?;
        self.mark_checked(now);
        self.notify(&report.created).await;
        Ok(report)
    }

    async fn notify(&self, alerts: &[Alert]) {
        if self.dispatcher.is_empty() {
            return;
        }
        for alert in alerts {
            let flight = match self.store.get_flight(alert.flight_id).await {
                Ok(flight) => flight,
                Err(e) => {
                    debug!(alert_id = %alert.id, error = %e, "flight lookup for notification failed");
                    None
                }
            };
            let results = self.dispatcher.notify_alert(alert, flight.as_ref()).await;
            let failed = results.iter().filter(|r| !r.success).count();
            if failed > 0 {
                warn!(alert_id = %alert.id, failed, "alert notification incomplete");
            }
        }
    }

    /// Comprehensive pass over every active flight.
    ///
    /// Failing to list flights aborts the sweep; per-flight failures are
    /// collected in the report.
    pub(crate) async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, MonitorError> {
        let flights = self.store.active_flights().await?;
        let mut report = SweepReport {
            started_at: now,
            flights_checked: flights.len(),
            suggestions: Vec::new(),
            crew_checked: 0,
            errors: Vec::new(),
        };

        for flight in &flights {
            if let Err(e) = self.sweep_flight(flight, now, &mut report).await {
                warn!(flight_id = %flight.id, error = %e, "sweep failed for flight");
                report.errors.push(FlightFailure {
                    flight_id: flight.id,
                    error: e.to_string(),
                });
            }
        }

        self.mark_checked(now);
        info!(
            flights = report.flights_checked,
            suggestions = report.suggestions.len(),
            crew = report.crew_checked,
            errors = report.errors.len(),
            "comprehensive sweep complete"
        );
        Ok(report)
    }

    async fn sweep_flight(
        &self,
        flight: &Flight,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) -> Result<(), MonitorError> {
        let open = self
            .store
            .list_alerts(&AlertFilter::for_flight(flight.id).unresolved())
            .await?;
        if open.iter().any(|a| a.kind.is_disruption()) {
            if let Some(alert) = self.suggest_if_needed(flight, now).await? {
                report.suggestions.push(alert);
            }
        }

        for crew_id in &flight.crew_ids {
            match self.duty.refresh_at(*crew_id, now).await {
                Ok(_) => report.crew_checked += 1,
                Err(DutyError::CrewNotFound(id)) => {
                    debug!(flight_id = %flight.id, crew_id = %id, "assigned crew member missing");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Raise a suggestion advisory when the flight has no plans yet.
    async fn suggest_if_needed(
        &self,
        flight: &Flight,
        now: DateTime<Utc>,
    ) -> Result<Option<Alert>, MonitorError> {
        if !self.store.backups_for_flight(flight.id).await?.is_empty() {
            return Ok(None);
        }
        let drafts = self.backups.suggest_plans(flight.id).await?;
        if drafts.is_empty() {
            return Ok(None);
        }

        let message = format!("Backup plans available: {} options suggested", drafts.len());
        let created = self
            .store
            .insert_alert_if_absent(NewAlert::new(flight.id, AlertKind::Advisory, message), now)
            .await?;
        if let Some(alert) = &created {
            info!(flight_id = %flight.id, options = drafts.len(), "backup plans suggested");
            self.detector.audit_log().log(
                flight.id,
                LogLevel::Info,
                Phase::Suggestion,
                alert.message.clone(),
            );
        }
        Ok(created)
    }
}

pub struct DisruptionMonitor {
    core: Arc<MonitorCore>,
    detector_ticker: Ticker,
    sweep_ticker: Ticker,
}

impl DisruptionMonitor {
    pub fn new(
        store: Arc<dyn Store>,
        detector: Arc<DisruptionDetector>,
        duty: Arc<DutyTracker>,
        backups: Arc<BackupResolver>,
    ) -> Self {
        let core = Arc::new(MonitorCore {
            store,
            detector,
            duty,
            backups,
            dispatcher: Arc::new(Dispatcher::empty()),
            last_check: Mutex::new(None),
        });
        Self::assemble(core, DEFAULT_DETECTOR_INTERVAL, DEFAULT_SWEEP_INTERVAL)
    }

    fn assemble(core: Arc<MonitorCore>, detector_every: Duration, sweep_every: Duration) -> Self {
        Self {
            detector_ticker: Ticker::new(Arc::new(DetectionTask::new(Arc::clone(&core))), detector_every),
            sweep_ticker: Ticker::new(Arc::new(SweepTask::new(Arc::clone(&core))), sweep_every),
            core,
        }
    }

    /// Override the loop periods. Only meaningful before [`start`](Self::start).
    pub fn with_intervals(self, detector_every: Duration, sweep_every: Duration) -> Self {
        let Self { core, .. } = self;
        Self::assemble(core, detector_every, sweep_every)
    }

    pub fn with_config(self, config: &MonitorConfig) -> Self {
        self.with_intervals(
            Duration::from_secs(config.detector_interval_secs),
            Duration::from_secs(config.sweep_interval_secs),
        )
    }

    /// Deliver newly detected alerts through `dispatcher`.
    pub fn with_dispatcher(self, dispatcher: Arc<Dispatcher>) -> Self {
        let Self {
            core,
            detector_ticker,
            sweep_ticker,
        } = self;
        let (detector_every, sweep_every) = (detector_ticker.period(), sweep_ticker.period());
        let core = Arc::new(MonitorCore {
            store: Arc::clone(&core.store),
            detector: Arc::clone(&core.detector),
            duty: Arc::clone(&core.duty),
            backups: Arc::clone(&core.backups),
            dispatcher,
            last_check: Mutex::new(core.last_check()),
        });
        Self::assemble(core, detector_every, sweep_every)
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.core.store
    }

    pub fn detector(&self) -> &Arc<DisruptionDetector> {
        &self.core.detector
    }

    pub fn duty(&self) -> &Arc<DutyTracker> {
        &self.core.duty
    }

    pub fn backups(&self) -> &Arc<BackupResolver> {
        &self.core.backups
    }

    // ── Lifecycle ────────────────────────────────────────────

    /// Start both loops. Returns `false` when already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        if self.is_running() {
            debug!("monitor already running");
            return false;
        }
        self.detector_ticker.start();
        self.sweep_ticker.start();
        info!(
            detector_secs = self.detector_ticker.period().as_secs_f64(),
            sweep_secs = self.sweep_ticker.period().as_secs_f64(),
            "disruption monitor started"
        );
        true
    }

    /// Stop both loops. Returns `false` when not running.
    pub fn stop(&self) -> bool {
        let detector = self.detector_ticker.stop();
        let sweep = self.sweep_ticker.stop();
        if detector || sweep {
            info!("disruption monitor stopped");
        }
        detector || sweep
    }

    pub fn is_running(&self) -> bool {
        self.detector_ticker.is_running() || self.sweep_ticker.is_running()
    }

    pub async fn trigger_check(&self) -> Result<CheckReport, MonitorError> {
        self.trigger_check_at(Utc::now()).await
    }

    /// One detector cycle and one sweep, run inline.
    pub async fn trigger_check_at(&self, now: DateTime<Utc>) -> Result<CheckReport, MonitorError> {
        info!("manual disruption check");
        let detection = self.core.detect(now).await?;
        let sweep = self.core.sweep(now).await?;
        Ok(CheckReport { detection, sweep })
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, MonitorError> {
        self.core.sweep(now).await
    }

    // ── Commands ─────────────────────────────────────────────

    pub async fn resolve_alert(&self, alert_id: AlertId) -> Result<Alert, MonitorError> {
        match self.core.store.set_alert_resolved(alert_id, true).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Err(MonitorError::AlertNotFound(alert_id)),
            Err(e) => return Err(e.into()),
        }
        let alert = self
            .core
            .store
            .get_alert(alert_id)
            .await?
            .ok_or(MonitorError::AlertNotFound(alert_id))?;
        info!(alert_id = %alert_id, flight_id = %alert.flight_id, "alert resolved");
        Ok(alert)
    }

    // ── Reads ────────────────────────────────────────────────

    pub async fn status(&self) -> Result<MonitorStatus, MonitorError> {
        let store = &self.core.store;
        let active_alert_count = store.list_alerts(&AlertFilter::all().unresolved()).await?.len();
        let monitored_flight_count = store.active_flights().await?.len();
        let non_compliant_crew_count = store
            .list_crew()
            .await?
            .iter()
            .filter(|c| !c.rest_compliant)
            .count();

        Ok(MonitorStatus {
            is_running: self.is_running(),
            last_check_time: self.core.last_check(),
            active_alert_count,
            monitored_flight_count,
            non_compliant_crew_count,
        })
    }

    pub async fn summary(&self) -> Result<Vec<FlightSummary>, MonitorError> {
        self.summary_at(Utc::now()).await
    }

    /// Per-flight disruption picture for every active flight, most severe first.
    pub async fn summary_at(&self, now: DateTime<Utc>) -> Result<Vec<FlightSummary>, MonitorError> {
        let store = &self.core.store;
        let flights = store.active_flights().await?;
        let mut summaries = Vec::with_capacity(flights.len());

        for flight in flights {
            let alerts = store
                .list_alerts(&AlertFilter::for_flight(flight.id).unresolved())
                .await?;
            let reports = self.core.duty.flight_compliance_at(&flight, now).await?;
            let violations = crew_violations(&reports);
            let has_backup_plans = !store.backups_for_flight(flight.id).await?.is_empty();
            let severity = flight_severity(&alerts, &violations, has_backup_plans);

            summaries.push(FlightSummary {
                flight_id: flight.id,
                crew_issues: violations.iter().map(ToString::to_string).collect(),
                tail_number: flight.tail_number,
                origin: flight.origin,
                destination: flight.destination,
                status: flight.status,
                alerts,
                has_backup_plans,
                severity,
            });
        }

        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    pub async fn flight_details(&self, flight_id: FlightId) -> Result<FlightDetails, MonitorError> {
        let store = &self.core.store;
        let flight = store
            .get_flight(flight_id)
            .await?
            .ok_or(MonitorError::FlightNotFound(flight_id))?;

        let alerts = store.list_alerts(&AlertFilter::for_flight(flight_id)).await?;
        let crew_compliance = self.core.duty.flight_compliance(&flight).await?;
        let backup_plans = store.backups_for_flight(flight_id).await?;
        let suggestions = self.core.backups.suggest_plans(flight_id).await?;
        let activity = self
            .core
            .detector
            .audit_log()
            .query(flight_id, &LogQuery::default());

        Ok(FlightDetails {
            flight,
            alerts,
            crew_compliance,
            backup_plans,
            suggestions,
            activity,
        })
    }
}
