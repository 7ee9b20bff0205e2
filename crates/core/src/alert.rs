use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flight::FlightId;

pub type AlertId = Uuid;

/// Signal channel an alert belongs to.
///
/// `Advisory` covers informational alerts (backup suggestions and
/// activation records); it never contributes to flight severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Weather,
    Crew,
    Mechanical,
    Airport,
    Advisory,
}

impl AlertKind {
    /// Disruption channels, i.e. every kind except `Advisory`.
    pub fn is_disruption(&self) -> bool {
        !matches!(self, AlertKind::Advisory)
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Weather => write!(f, "weather"),
            AlertKind::Crew => write!(f, "crew"),
            AlertKind::Mechanical => write!(f, "mechanical"),
            AlertKind::Airport => write!(f, "airport"),
            AlertKind::Advisory => write!(f, "advisory"),
        }
    }
}

impl std::str::FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weather" => Ok(AlertKind::Weather),
            "crew" => Ok(AlertKind::Crew),
            "mechanical" => Ok(AlertKind::Mechanical),
            "airport" => Ok(AlertKind::Airport),
            "advisory" => Ok(AlertKind::Advisory),
            other => Err(format!("unknown alert type '{other}'")),
        }
    }
}

/// Ordered severity tier: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// One tier down for critical and high; low and medium are unchanged.
    pub fn downgrade(self) -> Self {
        match self {
            Severity::Critical => Severity::High,
            Severity::High => Severity::Medium,
            other => other,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A persisted operational alert (`alerts` table).
///
/// At most one unresolved alert exists per `(flight_id, kind)` for
/// detector-raised kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub flight_id: FlightId,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub resolved: bool,
}

/// Alert contents before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub flight_id: FlightId,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
}

impl NewAlert {
    pub fn new(flight_id: FlightId, kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            flight_id,
            kind,
            message: message.into(),
        }
    }

    /// Materialize as an unresolved alert triggered at `at`.
    pub fn into_alert(self, at: DateTime<Utc>) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            flight_id: self.flight_id,
            kind: self.kind,
            message: self.message,
            triggered_at: at,
            resolved: false,
        }
    }
}
