use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crew::CrewId;
use crate::flight::FlightId;

pub type BackupPlanId = Uuid;

/// A registered alternate crew/aircraft/destination combination.
///
/// Plans are tried in ascending `priority`. `activated` flips to `true`
/// exactly once, on a successful activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupPlan {
    pub id: BackupPlanId,
    pub flight_id: FlightId,
    pub crew_ids: Vec<CrewId>,
    pub aircraft_id: String,
    pub fallback_airport: Option<String>,
    pub priority: u32,
    pub activated: bool,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
}

/// Plan contents before persistence. Also the shape of a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupPlanDraft {
    #[serde(default)]
    pub crew_ids: Vec<CrewId>,
    pub aircraft_id: String,
    #[serde(default)]
    pub fallback_airport: Option<String>,
    #[serde(default)]
    pub priority: Option<u32>,
    /// Why the plan was proposed (suggestions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl BackupPlanDraft {
    pub fn into_plan(self, flight_id: FlightId, at: DateTime<Utc>) -> BackupPlan {
        BackupPlan {
            id: Uuid::new_v4(),
            flight_id,
            crew_ids: self.crew_ids,
            aircraft_id: self.aircraft_id,
            fallback_airport: self.fallback_airport.filter(|a| !a.is_empty()),
            priority: self.priority.unwrap_or(1),
            activated: false,
            created_at: at,
            activated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_defaults_priority_to_one() {
        let draft = BackupPlanDraft {
            crew_ids: vec![],
            aircraft_id: "N550BB".to_string(),
            fallback_airport: Some(String::new()),
            priority: None,
            rationale: None,
        };
        let plan = draft.into_plan(Uuid::new_v4(), Utc::now());
        assert_eq!(plan.priority, 1);
        assert!(!plan.activated);
        assert!(plan.fallback_airport.is_none());
    }
}
