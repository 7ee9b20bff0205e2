//! Read models returned by the monitor.

use chrono::{DateTime, Utc};
use serde::Serialize;

use charterops_core::{Alert, BackupPlan, BackupPlanDraft, Flight, FlightId, FlightStatus, Severity};
use charterops_rules::audit_log::LogEntry;
use charterops_rules::detector::FlightFailure;
use charterops_rules::{ComplianceReport, DetectionReport};

#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub is_running: bool,
    /// Completion time of the latest detector cycle or sweep.
    pub last_check_time: Option<DateTime<Utc>>,
    /// Unresolved alerts of every type.
    pub active_alert_count: usize,
    pub monitored_flight_count: usize,
    /// Crew whose cached rest flag is false.
    pub non_compliant_crew_count: usize,
}

/// One active flight's disruption picture.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub flight_id: FlightId,
    pub tail_number: String,
    pub origin: String,
    pub destination: String,
    pub status: FlightStatus,
    /// Unresolved alerts, newest first.
    pub alerts: Vec<Alert>,
    pub crew_issues: Vec<String>,
    pub has_backup_plans: bool,
    pub severity: Severity,
}

impl FlightSummary {
    pub fn latest_alert_at(&self) -> Option<DateTime<Utc>> {
        self.alerts.iter().map(|a| a.triggered_at).max()
    }
}

/// Severity descending, then most recent alert first. Flights without
/// alerts sort after flights with alerts in the same tier.
pub fn sort_summaries(summaries: &mut [FlightSummary]) {
    summaries.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.latest_alert_at().cmp(&a.latest_alert_at()))
    });
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightDetails {
    pub flight: Flight,
    /// Every alert for the flight, resolved included, newest first.
    pub alerts: Vec<Alert>,
    pub crew_compliance: Vec<ComplianceReport>,
    pub backup_plans: Vec<BackupPlan>,
    pub suggestions: Vec<BackupPlanDraft>,
    /// Recent detection and activation decisions for the flight.
    pub activity: Vec<LogEntry>,
}

/// Outcome of one comprehensive sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub flights_checked: usize,
    /// Backup-suggestion advisories raised this sweep.
    pub suggestions: Vec<Alert>,
    /// Crew compliance checks run.
    pub crew_checked: usize,
    pub errors: Vec<FlightFailure>,
}

impl SweepReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of a manual "check now".
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub detection: DetectionReport,
    pub sweep: SweepReport,
}
