//! Disruption detection across the weather, crew, and airport channels.
//!
//! A detection cycle pulls every active flight (scheduled or delayed),
//! runs the three channel checks in [`checks`] and materializes each
//! finding as an alert with create-if-absent semantics. Dedup goes through
//! [`Store::insert_alert_if_absent`], so overlapping cycles (a scheduled
//! tick racing a manual check) still leave at most one unresolved alert
//! per `(flight, type)`.
//!
//! Mechanical alerts are never raised here; they arrive through
//! [`DisruptionDetector::submit_alert`], which also marks the flight
//! delayed.

pub mod checks;


use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use charterops_core::{
    Alert, AlertKind, CrewMember, Flight, FlightId, FlightStatus, NewAlert, ReferenceData,
};
use charterops_storage::{Store, StoreError};

use crate::audit_log::{AuditLog, LogLevel, Phase};
use crate::weather::{WeatherError, WeatherReport, WeatherSource};

pub use checks::{airport_check, crew_check, weather_check, DisruptionCheck};

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("flight not found: {0}")]
    FlightNotFound(FlightId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Findings for one flight plus any weather lookup that failed.
#[derive(Debug, Clone, Default)]
pub struct FlightEvaluation {
    pub findings: Vec<DisruptionCheck>,
    /// `(airport, error)` per failed lookup; the other airport is still checked.
    pub weather_errors: Vec<(String, WeatherError)>,
}

/// A flight whose evaluation or alert write failed during a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct FlightFailure {
    pub flight_id: FlightId,
    pub error: String,
}

/// Outcome of one detection cycle.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub started_at: DateTime<Utc>,
    pub flights_checked: usize,
    pub findings: Vec<DisruptionCheck>,
    /// Alerts inserted this cycle (findings with an open alert are skipped).
    pub created: Vec<Alert>,
    /// Partial coverage: flights or channels that failed.
    pub errors: Vec<FlightFailure>,
}

impl DetectionReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct DisruptionDetector {
    store: Arc<dyn Store>,
    weather: Arc<dyn WeatherSource>,
    reference: Arc<ReferenceData>,
    audit: Arc<AuditLog>,
}

impl DisruptionDetector {
    pub fn new(
        store: Arc<dyn Store>,
        weather: Arc<dyn WeatherSource>,
        reference: Arc<ReferenceData>,
    ) -> Self {
        Self {
            store,
            weather,
            reference,
            audit: Arc::new(AuditLog::new()),
        }
    }

    /// Share an audit log with other components.
    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    async fn lookup_weather(
        &self,
        flight: &Flight,
        airport: &str,
        evaluation: &mut FlightEvaluation,
    ) -> Option<WeatherReport> {
        match self.weather.get_weather(airport).await {
            Ok(report) => report,
            Err(e) => {
                warn!(flight_id = %flight.id, airport, error = %e, "weather lookup failed");
                evaluation.weather_errors.push((airport.to_string(), e));
                None
            }
        }
    }

    /// Run the three channel checks for one flight.
    ///
    /// Origin and destination weather are looked up independently; a failed
    /// lookup skips that airport and is returned alongside the findings.
    pub async fn evaluate_flight(&self, flight: &Flight, crew: &[CrewMember]) -> FlightEvaluation {
        let mut evaluation = FlightEvaluation::default();

        let origin = self
            .lookup_weather(flight, &flight.origin, &mut evaluation)
            .await;
        let destination = self
            .lookup_weather(flight, &flight.destination, &mut evaluation)
            .await;
        evaluation
            .findings
            .extend(weather_check(flight, origin.as_ref(), destination.as_ref()));
        evaluation.findings.extend(crew_check(flight, crew));
        evaluation.findings.extend(airport_check(flight, &self.reference));
        evaluation
    }

    /// Insert the alert for `check` unless one is already open.
    pub async fn materialize(
        &self,
        check: &DisruptionCheck,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError> {
        let created = self
            .store
            .insert_alert_if_absent(check.to_new_alert(), at)
            .await?;
        match &created {
            Some(alert) => {
                info!(
                    flight_id = %check.flight_id,
                    kind = %check.kind,
                    severity = %check.severity,
                    alert_id = %alert.id,
                    "alert raised"
                );
                self.audit.log_with_details(
                    check.flight_id,
                    LogLevel::Info,
                    Phase::Detection,
                    check.message.clone(),
                    serde_json::to_value(check).ok(),
                );
            }
            None => {
                debug!(flight_id = %check.flight_id, kind = %check.kind, "alert already open");
                self.audit.log(
                    check.flight_id,
                    LogLevel::Debug,
                    Phase::Dedup,
                    format!("{} alert already open", check.kind),
                );
            }
        }
        Ok(created)
    }

    pub async fn run_cycle(&self) -> Result<DetectionReport, DetectorError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// One detection pass over every active flight.
    ///
    /// Failing to list flights or crew aborts the cycle. Failures for an
    /// individual flight are collected in the report and the cycle moves on.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<DetectionReport, DetectorError> {
        let flights = self.store.active_flights().await?;
        let crew = self.store.list_crew().await?;

        let mut report = DetectionReport {
            started_at: now,
            flights_checked: flights.len(),
            findings: Vec::new(),
            created: Vec::new(),
            errors: Vec::new(),
        };

        for flight in &flights {
            let evaluation = self.evaluate_flight(flight, &crew).await;
            for (airport, e) in &evaluation.weather_errors {
                report.errors.push(FlightFailure {
                    flight_id: flight.id,
                    error: format!("weather at {airport}: {e}"),
                });
            }

            for check in evaluation.findings {
                match self.materialize(&check, now).await {
                    Ok(Some(alert)) => report.created.push(alert),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(flight_id = %flight.id, error = %e, "alert write failed");
                        report.errors.push(FlightFailure {
                            flight_id: flight.id,
                            error: e.to_string(),
                        });
                    }
                }
                report.findings.push(check);
            }
        }

        info!(
            flights = report.flights_checked,
            findings = report.findings.len(),
            created = report.created.len(),
            errors = report.errors.len(),
            "detection cycle complete"
        );
        Ok(report)
    }

    pub async fn submit_alert(&self, alert: NewAlert) -> Result<Alert, DetectorError> {
        self.submit_alert_at(alert, Utc::now()).await
    }

    /// Ingest an externally reported alert.
    ///
    /// Mechanical alerts move the flight to delayed and append the message
    /// to its issue list.
    pub async fn submit_alert_at(
        &self,
        alert: NewAlert,
        at: DateTime<Utc>,
    ) -> Result<Alert, DetectorError> {
        let mut flight = self
            .store
            .get_flight(alert.flight_id)
            .await?
            .ok_or(DetectorError::FlightNotFound(alert.flight_id))?;

        let mechanical = alert.kind == AlertKind::Mechanical;
        let created = self.store.insert_alert(alert, at).await?;

        if mechanical {
            flight.status = FlightStatus::Delayed;
            flight.issues.push(created.message.clone());
            self.store.update_flight(&flight).await?;
            info!(flight_id = %flight.id, "mechanical issue reported, flight delayed");
        }

        self.audit.log(
            created.flight_id,
            LogLevel::Info,
            Phase::Ingestion,
            format!("{} alert submitted: {}", created.kind, created.message),
        );
        Ok(created)
    }
}
