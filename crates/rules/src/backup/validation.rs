//! Per-candidate validation gate for backup activation.

use chrono::{DateTime, Utc};

use charterops_core::{BackupPlan, CrewMember, ReferenceData};
use charterops_storage::Store;

use crate::duty::{DutyError, DutyTracker};

/// What a single plan looks like after the crew, aircraft and airport checks.
#[derive(Debug, Clone, Default)]
pub struct CandidateValidation {
    /// Crew that passed compliance; the set the flight is rewritten to.
    pub crew: Vec<CrewMember>,
    /// Listed crew that were dropped, with the reason.
    pub dropped: Vec<String>,
    /// Reasons the plan as a whole is rejected.
    pub failures: Vec<String>,
}

impl CandidateValidation {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn crew_names(&self) -> Vec<&str> {
        self.crew.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Check every listed crew member, the aircraft and the fallback airport.
///
/// A crew member passes only with a clean compliance report and a
/// rest-compliant cache entry. Failing members are dropped; the plan fails
/// when nobody is left, carrying each dropped member's reason.
pub(crate) async fn validate_candidate(
    plan: &BackupPlan,
    store: &dyn Store,
    duty: &DutyTracker,
    reference: &ReferenceData,
    now: DateTime<Utc>,
) -> Result<CandidateValidation, DutyError> {
    let mut result = CandidateValidation::default();

    for crew_id in &plan.crew_ids {
        let Some(member) = store.get_crew(*crew_id).await? else {
            result.dropped.push(format!("Crew member {crew_id} not found"));
            continue;
        };
        let report = duty.compliance_check_at(*crew_id, now).await?;
        if report.is_compliant && member.rest_compliant {
            result.crew.push(member);
        } else {
            let mut reasons: Vec<String> =
                report.violations.iter().map(ToString::to_string).collect();
            if !member.rest_compliant && reasons.is_empty() {
                reasons.push("Insufficient rest period".to_string());
            }
            result
                .dropped
                .push(format!("{}: {}", member.name, reasons.join(", ")));
        }
    }

    if result.crew.is_empty() {
        result
            .failures
            .push("No backup crew available or compliant".to_string());
        result.failures.extend(result.dropped.iter().cloned());
    }
    if !reference.is_aircraft_available(&plan.aircraft_id) {
        result.failures.push("Backup aircraft not available".to_string());
    }
    if let Some(airport) = &plan.fallback_airport {
        if !reference.is_airport_suitable(airport) {
            result.failures.push("Fallback airport not suitable".to_string());
        }
    }

    Ok(result)
}
