use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crew::CrewId;

pub type FlightId = Uuid;

/// Operational status of a charter flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Scheduled,
    Delayed,
    Diverted,
    Completed,
}

impl FlightStatus {
    /// Whether flights in this status are still watched for disruptions.
    pub fn is_active(&self) -> bool {
        matches!(self, FlightStatus::Scheduled | FlightStatus::Delayed)
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightStatus::Scheduled => write!(f, "scheduled"),
            FlightStatus::Delayed => write!(f, "delayed"),
            FlightStatus::Diverted => write!(f, "diverted"),
            FlightStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A charter flight as stored in the `flights` table.
///
/// The detector escalates `status` and appends to `issues`; backup
/// activation rewrites `crew_ids` and possibly `destination`. Flights
/// are never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: FlightId,
    /// Registration of the scheduled aircraft (e.g. "N550BA").
    pub tail_number: String,
    /// ICAO code of the departure airport.
    pub origin: String,
    /// ICAO code of the arrival airport.
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub status: FlightStatus,
    pub crew_ids: Vec<CrewId>,
    /// Free-text issues appended by mechanical alert ingestion.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl Flight {
    /// Build a scheduled flight with no crew and no issues.
    pub fn new(
        tail_number: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tail_number: tail_number.into(),
            origin: origin.into(),
            destination: destination.into(),
            departure_time,
            arrival_time,
            status: FlightStatus::Scheduled,
            crew_ids: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn with_crew(mut self, crew_ids: Vec<CrewId>) -> Self {
        self.crew_ids = crew_ids;
        self
    }

    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}
