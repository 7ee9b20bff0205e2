//! Checks the shipped reference tables in `data/reference.toml` load and
//! drive the airport and backup rules the way operations expect.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use charterops_core::{AlertKind, CrewMember, DutyRecord, Flight, ReferenceData, Severity};
use charterops_rules::detector::airport_check;
use charterops_rules::{BackupResolver, DutyTracker};
use charterops_storage::{MemoryStore, Store};

/// Integration tests run from the crate directory, so go up two levels.
fn shipped() -> ReferenceData {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let path = manifest.join("../../data/reference.toml");
    ReferenceData::from_file(&path)
        .unwrap_or_else(|e| panic!("failed to load {}: {e}", path.display()))
}

#[test]
fn shipped_tables_parse() {
    let data = shipped();
    assert!(data.is_aircraft_available("N604CL"));
    assert!(data.is_airport_suitable("KHPN"));
    assert!(data.curfew("KJFK").unwrap().is_open_all_day());
    assert_eq!(data.curfew("KLAX").unwrap().utc_offset_hours, -8);
}

#[test]
fn curfew_is_evaluated_in_local_time() {
    let data = shipped();
    // 05:00 UTC is midnight at Teterboro.
    let dep = Utc.with_ymd_and_hms(2026, 2, 10, 5, 0, 0).unwrap();
    let late = Flight::new("N550BA", "KTEB", "KJFK", dep, dep + Duration::hours(1));
    let check = airport_check(&late, &data).unwrap();
    assert_eq!(check.kind, AlertKind::Airport);
    assert_eq!(check.severity, Severity::High);
    assert_eq!(check.issues, vec!["Departure during curfew hours at KTEB".to_string()]);

    // Departs noon at Teterboro, lands 14:00 in Los Angeles.
    let dep = Utc.with_ymd_and_hms(2026, 2, 10, 17, 0, 0).unwrap();
    let midday = Flight::new("N550BA", "KTEB", "KLAX", dep, dep + Duration::hours(5));
    assert!(airport_check(&midday, &data).is_none());
}

#[tokio::test]
async fn suggestions_follow_shipped_alternates() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    for name in ["Capt. Haines", "FO Adeyemi"] {
        let member = store.insert_crew(CrewMember::new(name)).await.unwrap();
        store
            .insert_duty_record(DutyRecord::completed_rest(
                member.id,
                now - Duration::hours(13),
                now - Duration::hours(1),
            ))
            .await
            .unwrap();
    }
    let dep = now + Duration::days(1);
    let flight = store
        .insert_flight(Flight::new("N550BA", "KTEB", "KHPN", dep, dep + Duration::hours(1)))
        .await
        .unwrap();

    let resolver = BackupResolver::new(
        store.clone(),
        Arc::new(DutyTracker::new(store.clone())),
        Arc::new(shipped()),
    );
    let drafts = resolver.suggest_plans(flight.id).await.unwrap();
    assert_eq!(drafts.len(), 3);
    assert_eq!(drafts[1].aircraft_id, "N550BB");
    // KHPN is the destination, so the next alternate is proposed.
    assert_eq!(drafts[2].fallback_airport.as_deref(), Some("KTEB"));
}
