use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flight::FlightId;

pub type CrewId = Uuid;
pub type DutyRecordId = Uuid;

/// A crew member as stored in the `crew` table.
///
/// `current_duty` and `rest_compliant` are caches of what the duty
/// tracker derives from [`DutyRecord`]s; the records are authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: CrewId,
    pub name: String,
    /// Duty hours, never negative.
    pub current_duty: f64,
    pub rest_compliant: bool,
    pub assigned_flight: Option<FlightId>,
}

impl CrewMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            current_duty: 0.0,
            rest_compliant: true,
            assigned_flight: None,
        }
    }

    pub fn with_duty(mut self, hours: f64) -> Self {
        self.current_duty = hours;
        self
    }

    pub fn with_rest_compliant(mut self, rest_compliant: bool) -> Self {
        self.rest_compliant = rest_compliant;
        self
    }
}

/// Append-only duty/rest log entry (`duty_records` table).
///
/// Duty blocks carry `start_time..end_time`. Rest periods additionally
/// carry `rest_start`; a rest period is open while `rest_end` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyRecord {
    pub id: DutyRecordId,
    pub crew_id: CrewId,
    pub flight_id: Option<FlightId>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duty_hours: f64,
    #[serde(default)]
    pub rest_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rest_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rest_hours: Option<f64>,
}

impl DutyRecord {
    /// A duty block spanning `start..end`.
    pub fn duty(
        crew_id: CrewId,
        flight_id: Option<FlightId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            crew_id,
            flight_id,
            start_time: start,
            end_time: end,
            duty_hours: hours_between(start, end),
            rest_start: None,
            rest_end: None,
            rest_hours: None,
        }
    }

    /// A duty block of `hours` reported at `at`.
    ///
    /// The interval is collapsed to `at`; `duty_hours` carries the length.
    pub fn reported(
        crew_id: CrewId,
        flight_id: Option<FlightId>,
        at: DateTime<Utc>,
        hours: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            crew_id,
            flight_id,
            start_time: at,
            end_time: at,
            duty_hours: hours,
            rest_start: None,
            rest_end: None,
            rest_hours: None,
        }
    }

    /// An open rest period starting at `at`.
    pub fn open_rest(crew_id: CrewId, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            crew_id,
            flight_id: None,
            start_time: at,
            end_time: at,
            duty_hours: 0.0,
            rest_start: Some(at),
            rest_end: None,
            rest_hours: None,
        }
    }

    /// A rest period that already ended (used by seeding and tests).
    pub fn completed_rest(crew_id: CrewId, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let mut record = Self::open_rest(crew_id, start);
        record.rest_end = Some(end);
        record.rest_hours = Some(hours_between(start, end));
        record
    }

    pub fn is_rest(&self) -> bool {
        self.rest_start.is_some()
    }

    pub fn is_open_rest(&self) -> bool {
        self.rest_start.is_some() && self.rest_end.is_none()
    }
}

/// Fractional hours between two instants (negative if `end < start`).
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    end.signed_duration_since(start).num_milliseconds() as f64 / 3_600_000.0
}
