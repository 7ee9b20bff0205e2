//! Per-flight severity aggregation for disruption summaries.

use charterops_core::{Alert, AlertKind, Severity};

use crate::duty::{ComplianceReport, Violation};

/// Compliance violations of the non-compliant crew in `reports`.
pub fn crew_violations(reports: &[ComplianceReport]) -> Vec<&Violation> {
    reports
        .iter()
        .filter(|r| !r.is_compliant)
        .flat_map(|r| r.violations.iter())
        .collect()
}

/// Severity tier for one flight.
///
/// Rules, applied as floors so no later rule lowers an earlier one:
/// - an unresolved mechanical alert is critical
/// - a crew alert with at least one crew violation is high
/// - a weather alert is at least medium
/// - any crew violation is at least high
/// - a duty-hours violation is critical
///
/// Registered backup plans then downgrade critical to high and high to
/// medium. Resolved and advisory alerts are ignored.
pub fn flight_severity(
    alerts: &[Alert],
    crew_violations: &[&Violation],
    has_backup_plans: bool,
) -> Severity {
    let mut severity = Severity::Low;
    let has_crew_issues = !crew_violations.is_empty();

    for alert in alerts.iter().filter(|a| !a.resolved) {
        let floor = match alert.kind {
            AlertKind::Mechanical => Severity::Critical,
            AlertKind::Crew if has_crew_issues => Severity::High,
            AlertKind::Weather => Severity::Medium,
            _ => Severity::Low,
        };
        severity = severity.max(floor);
    }

    if crew_violations.iter().any(|v| v.is_duty_violation()) {
        severity = Severity::Critical;
    } else if has_crew_issues {
        severity = severity.max(Severity::High);
    }

    if has_backup_plans {
        severity = severity.downgrade();
    }
    severity
}
