//! Pure per-channel checks. Each returns at most one finding per flight.

use serde::Serialize;

use charterops_core::{AlertKind, CrewMember, Flight, FlightId, NewAlert, ReferenceData, Severity};

use crate::duty::{APPROACH_MARGIN_HOURS, MAX_DUTY_HOURS};
use crate::weather::WeatherReport;

/// Visibility below this (statute miles) is a high-severity weather issue.
pub const MIN_VISIBILITY_SM: f64 = 1.0;
/// Ceiling below this (feet) is a high-severity weather issue.
pub const MIN_CEILING_FT: f64 = 500.0;
/// Wind above this (knots) is a medium-severity weather issue.
pub const MAX_WIND_KT: f64 = 25.0;

/// One channel's finding for one flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisruptionCheck {
    pub flight_id: FlightId,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    /// The individual reasons folded into `message`.
    pub issues: Vec<String>,
}

impl DisruptionCheck {
    fn from_issues(
        flight_id: FlightId,
        kind: AlertKind,
        prefix: &str,
        issues: Vec<(Severity, String)>,
    ) -> Option<Self> {
        let severity = issues.iter().map(|(s, _)| *s).max()?;
        let issues: Vec<String> = issues.into_iter().map(|(_, text)| text).collect();
        Some(Self {
            flight_id,
            kind,
            severity,
            message: format!("{prefix}: {}", issues.join(", ")),
            issues,
        })
    }

    pub fn to_new_alert(&self) -> NewAlert {
        NewAlert::new(self.flight_id, self.kind, self.message.clone())
    }
}

fn airport_weather_issues(airport: &str, report: &WeatherReport, out: &mut Vec<(Severity, String)>) {
    if report.visibility < MIN_VISIBILITY_SM {
        out.push((
            Severity::High,
            format!("Low visibility at {airport}: {}SM", report.visibility),
        ));
    }
    if report.ceiling < MIN_CEILING_FT {
        out.push((
            Severity::High,
            format!("Low ceiling at {airport}: {}ft", report.ceiling),
        ));
    }
    if report.wind_speed > MAX_WIND_KT {
        out.push((
            Severity::Medium,
            format!("High winds at {airport}: {}kt", report.wind_speed),
        ));
    }
}

/// Weather at origin and destination. Airports without a report are skipped.
pub fn weather_check(
    flight: &Flight,
    origin: Option<&WeatherReport>,
    destination: Option<&WeatherReport>,
) -> Option<DisruptionCheck> {
    let mut issues = Vec::new();
    if let Some(report) = origin {
        airport_weather_issues(&flight.origin, report, &mut issues);
    }
    if let Some(report) = destination {
        airport_weather_issues(&flight.destination, report, &mut issues);
    }
    DisruptionCheck::from_issues(flight.id, AlertKind::Weather, "Weather Alert", issues)
}

/// Duty and rest of the crew assigned to `flight`, read from the crew cache.
/// Members of `crew` not assigned to the flight are ignored.
pub fn crew_check(flight: &Flight, crew: &[CrewMember]) -> Option<DisruptionCheck> {
    let mut issues = Vec::new();
    for member in crew.iter().filter(|c| flight.crew_ids.contains(&c.id)) {
        if member.current_duty > MAX_DUTY_HOURS {
            issues.push((
                Severity::Critical,
                format!(
                    "{}: Duty violation ({}h > {}h limit)",
                    member.name, member.current_duty, MAX_DUTY_HOURS
                ),
            ));
        } else if member.current_duty > MAX_DUTY_HOURS - APPROACH_MARGIN_HOURS {
            issues.push((
                Severity::High,
                format!(
                    "{}: Approaching duty limit ({}h)",
                    member.name, member.current_duty
                ),
            ));
        }
        if !member.rest_compliant {
            issues.push((
                Severity::High,
                format!("{}: Insufficient rest period", member.name),
            ));
        }
    }
    DisruptionCheck::from_issues(flight.id, AlertKind::Crew, "Crew Duty Alert", issues)
}

/// Scheduled departure inside the origin curfew, or arrival inside the
/// destination curfew.
pub fn airport_check(flight: &Flight, reference: &ReferenceData) -> Option<DisruptionCheck> {
    let mut issues = Vec::new();
    if let Some(curfew) = reference.curfew(&flight.origin) {
        if curfew.covers(flight.departure_time) {
            issues.push((
                Severity::High,
                format!("Departure during curfew hours at {}", flight.origin),
            ));
        }
    }
    if let Some(curfew) = reference.curfew(&flight.destination) {
        if curfew.covers(flight.arrival_time) {
            issues.push((
                Severity::High,
                format!("Arrival during curfew hours at {}", flight.destination),
            ));
        }
    }
    DisruptionCheck::from_issues(flight.id, AlertKind::Airport, "Airport Alert", issues)
}
