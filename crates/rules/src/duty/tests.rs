use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use charterops_core::{CrewMember, DutyRecord, Flight};
use charterops_storage::{MemoryStore, Store, StoreOp};

use super::*;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

async fn setup() -> (Arc<MemoryStore>, DutyTracker) {
    let store = Arc::new(MemoryStore::new());
    let tracker = DutyTracker::new(store.clone());
    (store, tracker)
}

/// Crew member whose latest rest was `rest_hours` long and ended 20h before `now`.
async fn rested_crew(store: &MemoryStore, name: &str, rest_hours: i64, now: DateTime<Utc>) -> CrewMember {
    let crew = store.insert_crew(CrewMember::new(name)).await.unwrap();
    let end = now - Duration::hours(20);
    store
        .insert_duty_record(DutyRecord::completed_rest(
            crew.id,
            end - Duration::hours(rest_hours),
            end,
        ))
        .await
        .unwrap();
    crew
}

async fn add_duty(store: &MemoryStore, crew: &CrewMember, hours_ago: f64, length: f64) {
    let start = t0() - Duration::minutes((hours_ago * 60.0) as i64);
    let end = start + Duration::minutes((length * 60.0) as i64);
    store
        .insert_duty_record(DutyRecord::duty(crew.id, None, start, end))
        .await
        .unwrap();
}

// ── duty_hours ───────────────────────────────────────────────

#[tokio::test]
async fn duty_hours_zero_without_records() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Ana")).await.unwrap();
    assert_eq!(tracker.duty_hours_at(crew.id, t0()).await.unwrap(), 0.0);
}

#[tokio::test]
async fn duty_hours_sums_trailing_window_only() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Ben")).await.unwrap();
    add_duty(&store, &crew, 30.0, 5.0).await; // outside the 24h window
    add_duty(&store, &crew, 12.0, 4.0).await;
    add_duty(&store, &crew, 3.0, 2.5).await;

    let hours = tracker.duty_hours_at(crew.id, t0()).await.unwrap();
    assert!((hours - 6.5).abs() < 1e-9);
}

#[tokio::test]
async fn custom_window_narrows_sum() {
    let (store, _) = setup().await;
    let tracker = DutyTracker::new(store.clone()).with_window_hours(6);
    let crew = store.insert_crew(CrewMember::new("Cy")).await.unwrap();
    add_duty(&store, &crew, 12.0, 4.0).await;
    add_duty(&store, &crew, 3.0, 2.0).await;

    let hours = tracker.duty_hours_at(crew.id, t0()).await.unwrap();
    assert!((hours - 2.0).abs() < 1e-9);
}

// ── rest compliance ──────────────────────────────────────────

#[tokio::test]
async fn rest_compliant_false_without_rest_records() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Dee")).await.unwrap();
    assert!(!tracker.rest_compliant(crew.id).await.unwrap());
}

#[tokio::test]
async fn rest_compliant_uses_latest_completed_rest() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Eve", 12, t0()).await;
    assert!(tracker.rest_compliant(crew.id).await.unwrap());

    // A newer, short rest supersedes the long one.
    store
        .insert_duty_record(DutyRecord::completed_rest(
            crew.id,
            t0() - Duration::hours(8),
            t0() - Duration::hours(2),
        ))
        .await
        .unwrap();
    assert!(!tracker.rest_compliant(crew.id).await.unwrap());
}

// ── compliance_check ─────────────────────────────────────────

#[tokio::test]
async fn duty_over_max_is_violation() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Finn", 11, t0()).await;
    add_duty(&store, &crew, 11.0, 10.5).await;

    let report = tracker.compliance_check_at(crew.id, t0()).await.unwrap();
    assert!(!report.is_compliant);
    assert!(report.rest_compliant);
    assert!(report.has_duty_violation());
    assert!(report.violations[0]
        .to_string()
        .starts_with("Duty hours exceed maximum"));
    assert_eq!(
        report.violations[0].to_string(),
        "Duty hours exceed maximum: 10.5h > 10h"
    );
}

#[tokio::test]
async fn approaching_limit_is_warning_only() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Gia", 10, t0()).await;
    add_duty(&store, &crew, 10.0, 9.5).await;

    let report = tracker.compliance_check_at(crew.id, t0()).await.unwrap();
    assert!(report.is_compliant);
    assert!(report.violations.is_empty());
    assert_eq!(report.warnings, vec!["Approaching duty limit: 9.5h".to_string()]);
    assert_eq!(report.rest_hours_actual, 10.0);
    assert_eq!(report.rest_hours_required, MIN_REST_HOURS);
}

#[tokio::test]
async fn missing_rest_is_violation() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Hal")).await.unwrap();

    let report = tracker.compliance_check_at(crew.id, t0()).await.unwrap();
    assert!(!report.is_compliant);
    assert_eq!(report.violations, vec![Violation::InsufficientRest]);
    assert_eq!(report.issue_lines(), vec!["Hal: Insufficient rest period".to_string()]);
}

#[tokio::test]
async fn unknown_crew_is_not_found() {
    let (_, tracker) = setup().await;
    let err = tracker
        .compliance_check(uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, DutyError::CrewNotFound(_)));
}

#[tokio::test]
async fn store_failure_propagates() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Ivy")).await.unwrap();
    store.inject_failure(StoreOp::ListDutyRecords);
    let err = tracker.compliance_check(crew.id).await.unwrap_err();
    assert!(matches!(err, DutyError::Store(StoreError::Unavailable(_))));
}

// ── rest state machine ───────────────────────────────────────

#[tokio::test]
async fn ten_hour_rest_restores_compliance() {
    let (store, tracker) = setup().await;
    let crew = store
        .insert_crew(CrewMember::new("Jo").with_duty(9.0))
        .await
        .unwrap();

    tracker.start_rest_at(crew.id, t0()).await.unwrap();
    let outcome = tracker
        .end_rest_at(crew.id, t0() + Duration::hours(10))
        .await
        .unwrap();

    assert!(outcome.rest_compliant);
    let crew = store.get_crew(crew.id).await.unwrap().unwrap();
    assert!(crew.rest_compliant);
    assert_eq!(crew.current_duty, 0.0);
}

#[tokio::test]
async fn completed_rest_is_not_duty() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Jun")).await.unwrap();

    tracker.start_rest_at(crew.id, t0()).await.unwrap();
    let back = t0() + Duration::hours(11);
    tracker.end_rest_at(crew.id, back).await.unwrap();

    let report = tracker.compliance_check_at(crew.id, back).await.unwrap();
    assert_eq!(report.duty_hours, 0.0);
    assert!(report.is_compliant);
    assert!(report.violations.is_empty());

    let report = tracker.refresh_at(crew.id, back).await.unwrap();
    assert!(report.is_compliant);
    let cached = store.get_crew(crew.id).await.unwrap().unwrap();
    assert_eq!(cached.current_duty, 0.0);
}

#[tokio::test]
async fn nine_hour_rest_is_not_compliant() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Kai")).await.unwrap();

    tracker.start_rest_at(crew.id, t0()).await.unwrap();
    let outcome = tracker
        .end_rest_at(crew.id, t0() + Duration::hours(9))
        .await
        .unwrap();

    assert!(!outcome.rest_compliant);
    assert!((outcome.rest_hours - 9.0).abs() < 1e-9);
    let crew = store.get_crew(crew.id).await.unwrap().unwrap();
    assert!(!crew.rest_compliant);
    assert_eq!(crew.current_duty, 0.0);
}

#[tokio::test]
async fn open_rest_reads_as_resting() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Lou", 12, t0()).await;
    let mut assigned = crew.clone();
    assigned.assigned_flight = Some(uuid::Uuid::new_v4());
    store.update_crew(&assigned).await.unwrap();

    tracker.start_rest_at(crew.id, t0()).await.unwrap();

    assert!(tracker.duty_state(crew.id).await.unwrap().is_resting());
    assert!(!tracker.rest_compliant(crew.id).await.unwrap());
    let report = tracker.compliance_check_at(crew.id, t0()).await.unwrap();
    assert_eq!(report.violations, vec![Violation::Resting]);

    let cached = store.get_crew(crew.id).await.unwrap().unwrap();
    assert!(!cached.rest_compliant);
    assert!(cached.assigned_flight.is_none());
}

#[tokio::test]
async fn double_start_rest_rejected() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Max")).await.unwrap();
    tracker.start_rest_at(crew.id, t0()).await.unwrap();
    let err = tracker.start_rest_at(crew.id, t0()).await.unwrap_err();
    assert!(matches!(err, DutyError::AlreadyResting(_)));
}

#[tokio::test]
async fn end_rest_without_open_period() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Nia", 12, t0()).await;
    let err = tracker.end_rest_at(crew.id, t0()).await.unwrap_err();
    assert!(matches!(err, DutyError::NotResting(_)));
}

// ── update_duty ──────────────────────────────────────────────

#[tokio::test]
async fn update_duty_records_interval_and_cache() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Oz", 11, t0()).await;
    let flight_id = uuid::Uuid::new_v4();

    let updated = tracker
        .update_duty_at(crew.id, Some(flight_id), 6.0, t0())
        .await
        .unwrap();
    assert_eq!(updated.current_duty, 6.0);
    assert!(updated.rest_compliant);
    assert_eq!(updated.assigned_flight, Some(flight_id));

    let hours = tracker.duty_hours_at(crew.id, t0()).await.unwrap();
    assert!((hours - 6.0).abs() < 1e-9);
}

#[tokio::test]
async fn update_duty_accepts_out_of_range_hours() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Pia", 11, t0()).await;

    tracker.update_duty_at(crew.id, None, 14.0, t0()).await.unwrap();
    let report = tracker.compliance_check_at(crew.id, t0()).await.unwrap();
    assert!(report.has_duty_violation());
}

#[tokio::test]
async fn update_duty_beyond_window_length_is_still_counted() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Pat", 11, t0()).await;

    let updated = tracker.update_duty_at(crew.id, None, 30.0, t0()).await.unwrap();
    assert_eq!(updated.current_duty, 30.0);

    let report = tracker.compliance_check_at(crew.id, t0()).await.unwrap();
    assert_eq!(report.duty_hours, 30.0);
    assert_eq!(
        report.violations,
        vec![Violation::DutyExceeded { hours: 30.0, max: MAX_DUTY_HOURS }]
    );
}

#[tokio::test]
async fn update_duty_with_huge_hours_does_not_panic() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Ray", 11, t0()).await;

    tracker.update_duty_at(crew.id, None, 1.0e12, t0()).await.unwrap();
    let report = tracker.compliance_check_at(crew.id, t0()).await.unwrap();
    assert!(report.has_duty_violation());
}

#[tokio::test]
async fn repeated_updates_keep_cache_and_log_in_step() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Sky", 11, t0()).await;

    tracker.update_duty_at(crew.id, None, 6.0, t0()).await.unwrap();
    let updated = tracker
        .update_duty_at(crew.id, None, 6.0, t0() + Duration::hours(1))
        .await
        .unwrap();

    let report = tracker
        .compliance_check_at(crew.id, t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(updated.current_duty, report.duty_hours);
    assert_eq!(report.duty_hours, 12.0);
    assert!(report.has_duty_violation());

    let cached = store.get_crew(crew.id).await.unwrap().unwrap();
    assert_eq!(cached.current_duty, 12.0);
}

#[tokio::test]
async fn update_duty_rejects_negative_and_nan() {
    let (store, tracker) = setup().await;
    let crew = store.insert_crew(CrewMember::new("Quin")).await.unwrap();
    for bad in [-1.0, f64::NAN, f64::INFINITY] {
        let err = tracker.update_duty_at(crew.id, None, bad, t0()).await.unwrap_err();
        assert!(matches!(err, DutyError::Validation(_)));
    }
}

// ── availability and refresh ─────────────────────────────────

#[tokio::test]
async fn available_crew_filters_cache() {
    let (store, tracker) = setup().await;
    store.insert_crew(CrewMember::new("Fresh").with_duty(2.0)).await.unwrap();
    store.insert_crew(CrewMember::new("Tired").with_duty(8.0)).await.unwrap();
    store
        .insert_crew(CrewMember::new("Unrested").with_rest_compliant(false))
        .await
        .unwrap();

    let names: Vec<String> = tracker
        .available_crew()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Fresh".to_string()]);
}

#[tokio::test]
async fn refresh_writes_back_non_compliant_state() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Rae", 11, t0()).await;
    add_duty(&store, &crew, 12.0, 11.0).await;

    let report = tracker.refresh_at(crew.id, t0()).await.unwrap();
    assert!(!report.is_compliant);
    let cached = store.get_crew(crew.id).await.unwrap().unwrap();
    assert!((cached.current_duty - 11.0).abs() < 1e-9);
}

#[tokio::test]
async fn flight_compliance_skips_unknown_crew() {
    let (store, tracker) = setup().await;
    let crew = rested_crew(&store, "Sol", 11, t0()).await;
    let flight = Flight::new("N550BA", "KTEB", "KLAX", t0(), t0() + Duration::hours(5))
        .with_crew(vec![crew.id, uuid::Uuid::new_v4()]);

    let reports = tracker.flight_compliance_at(&flight, t0()).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].crew_name, "Sol");
}
