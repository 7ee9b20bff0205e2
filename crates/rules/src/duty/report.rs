//! Compliance report types produced by the [`DutyTracker`](super::DutyTracker).

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use charterops_core::CrewId;

/// Maximum duty hours inside the trailing window.
pub const MAX_DUTY_HOURS: f64 = 10.0;
/// Minimum length of a completed rest period.
pub const MIN_REST_HOURS: f64 = 10.0;
/// Duty within this many hours of the maximum raises a warning.
pub const APPROACH_MARGIN_HOURS: f64 = 2.0;
/// Crew at or above this duty level are not offered as backups.
pub const AVAILABLE_DUTY_CEILING: f64 = MAX_DUTY_HOURS - APPROACH_MARGIN_HOURS;

/// A hard compliance failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    DutyExceeded { hours: f64, max: f64 },
    InsufficientRest,
    /// An open rest period; the crew member cannot fly until it ends.
    Resting,
}

impl Violation {
    pub fn is_duty_violation(&self) -> bool {
        matches!(self, Violation::DutyExceeded { .. })
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::DutyExceeded { hours, max } => {
                write!(f, "Duty hours exceed maximum: {hours:.1}h > {max}h")
            }
            Violation::InsufficientRest => write!(f, "Insufficient rest period"),
            Violation::Resting => write!(f, "Currently in rest period"),
        }
    }
}

impl Serialize for Violation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whether a crew member is working or inside an open rest period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DutyState {
    OnDuty,
    Resting { since: DateTime<Utc> },
}

impl DutyState {
    pub fn is_resting(&self) -> bool {
        matches!(self, DutyState::Resting { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub crew_id: CrewId,
    pub crew_name: String,
    pub is_compliant: bool,
    pub duty_hours: f64,
    pub rest_compliant: bool,
    pub rest_hours_required: f64,
    /// Hours of the latest completed rest period, 0 if none.
    pub rest_hours_actual: f64,
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
}

impl ComplianceReport {
    pub fn has_duty_violation(&self) -> bool {
        self.violations.iter().any(Violation::is_duty_violation)
    }

    /// Violations and warnings rendered as `"{name}: {issue}"` lines.
    pub fn issue_lines(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(ToString::to_string)
            .chain(self.warnings.iter().cloned())
            .map(|issue| format!("{}: {issue}", self.crew_name))
            .collect()
    }
}

/// Result of closing a rest period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RestOutcome {
    pub rest_hours: f64,
    pub rest_compliant: bool,
}

/// Evaluate duty and rest facts against the limits.
pub(crate) fn assess(
    duty_hours: f64,
    rest: &RestStatus,
) -> (Vec<Violation>, Vec<String>) {
    let mut violations = Vec::new();
    let mut warnings = Vec::new();

    if duty_hours > MAX_DUTY_HOURS {
        violations.push(Violation::DutyExceeded {
            hours: duty_hours,
            max: MAX_DUTY_HOURS,
        });
    } else if duty_hours > MAX_DUTY_HOURS - APPROACH_MARGIN_HOURS {
        warnings.push(format!("Approaching duty limit: {duty_hours:.1}h"));
    }

    match rest {
        RestStatus::Resting { .. } => violations.push(Violation::Resting),
        RestStatus::Completed { hours } if *hours >= MIN_REST_HOURS => {}
        RestStatus::Completed { .. } | RestStatus::Never => {
            violations.push(Violation::InsufficientRest)
        }
    }

    (violations, warnings)
}

/// What the duty records say about a crew member's latest rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RestStatus {
    Never,
    Resting { since: DateTime<Utc> },
    Completed { hours: f64 },
}

impl RestStatus {
    pub(crate) fn is_compliant(&self) -> bool {
        matches!(self, RestStatus::Completed { hours } if *hours >= MIN_REST_HOURS)
    }

    pub(crate) fn completed_hours(&self) -> f64 {
        match self {
            RestStatus::Completed { hours } => *hours,
            _ => 0.0,
        }
    }
}
