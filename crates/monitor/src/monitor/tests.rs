use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use charterops_core::{
    AlertKind, BackupPlanDraft, CrewMember, DutyRecord, Flight, FlightStatus, ReferenceData,
    Severity,
};
use charterops_notify::{Notification, Notifier, NotifyError};
use charterops_rules::weather::WeatherReport;
use charterops_rules::StaticWeather;
use charterops_storage::{MemoryStore, StoreOp};

use super::*;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

fn flight(tail: &str, origin: &str, dest: &str) -> Flight {
    Flight::new(tail, origin, dest, t0(), t0() + Duration::hours(5))
}

fn foggy_klax() -> StaticWeather {
    StaticWeather::new()
        .with("KTEB", WeatherReport::basic(10.0, 2500.0, 10.0))
        .with("KLAX", WeatherReport::basic(0.5, 1800.0, 8.0))
}

fn monitor_with(store: Arc<MemoryStore>, weather: StaticWeather) -> DisruptionMonitor {
    let reference = Arc::new(ReferenceData::default());
    let detector = Arc::new(DisruptionDetector::new(
        store.clone(),
        Arc::new(weather),
        Arc::clone(&reference),
    ));
    let duty = Arc::new(DutyTracker::new(store.clone()));
    let backups = Arc::new(
        BackupResolver::new(store.clone(), Arc::clone(&duty), reference)
            .with_audit_log(Arc::clone(detector.audit_log())),
    );
    DisruptionMonitor::new(store, detector, duty, backups)
}

/// Crew member with a completed 12h rest ending an hour before `t0`.
async fn rested_crew(store: &MemoryStore, name: &str) -> CrewMember {
    let member = store.insert_crew(CrewMember::new(name)).await.unwrap();
    store
        .insert_duty_record(DutyRecord::completed_rest(
            member.id,
            t0() - Duration::hours(13),
            t0() - Duration::hours(1),
        ))
        .await
        .unwrap();
    member
}

struct CountingNotifier {
    sent: Arc<AtomicUsize>,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "counting"
    }
}

// ── Lifecycle ────────────────────────────────────────────────

#[tokio::test]
async fn start_and_stop_are_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let monitor = monitor_with(store, StaticWeather::new())
        .with_intervals(StdDuration::from_secs(3600), StdDuration::from_secs(3600));

    assert!(!monitor.is_running());
    assert!(monitor.start());
    assert!(!monitor.start());
    assert!(monitor.is_running());

    assert!(monitor.stop());
    assert!(!monitor.stop());
    assert!(!monitor.is_running());
}

#[tokio::test]
async fn start_runs_initial_checks_immediately() {
    let store = Arc::new(MemoryStore::new());
    store.insert_flight(flight("N550BA", "KTEB", "KLAX")).await.unwrap();
    let monitor = monitor_with(store.clone(), foggy_klax())
        .with_intervals(StdDuration::from_secs(3600), StdDuration::from_secs(3600));

    monitor.start();
    let mut status = monitor.status().await.unwrap();
    for _ in 0..100 {
        if status.last_check_time.is_some() && status.active_alert_count > 0 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
        status = monitor.status().await.unwrap();
    }
    monitor.stop();

    assert!(status.last_check_time.is_some());
    assert!(status.active_alert_count >= 1);
    assert_eq!(status.monitored_flight_count, 1);
}

// ── Sweep ────────────────────────────────────────────────────

#[tokio::test]
async fn sweep_suggests_backups_once() {
    let store = Arc::new(MemoryStore::new());
    let f = store.insert_flight(flight("N550BA", "KTEB", "KLAX")).await.unwrap();
    rested_crew(&store, "Capt. Ortiz").await;
    rested_crew(&store, "FO Lindqvist").await;
    let monitor = monitor_with(store.clone(), foggy_klax());

    let first = monitor.trigger_check_at(t0()).await.unwrap();
    assert_eq!(first.detection.created.len(), 1);
    assert_eq!(first.sweep.suggestions.len(), 1);
    assert_eq!(
        first.sweep.suggestions[0].message,
        "Backup plans available: 3 options suggested"
    );
    assert_eq!(first.sweep.suggestions[0].kind, AlertKind::Advisory);

    let second = monitor.sweep_at(t0() + Duration::minutes(1)).await.unwrap();
    assert!(second.suggestions.is_empty());

    let advisories = store
        .list_alerts(&AlertFilter::for_flight(f.id).of_kind(AlertKind::Advisory))
        .await
        .unwrap();
    assert_eq!(advisories.len(), 1);
}

#[tokio::test]
async fn sweep_skips_flights_with_plans_or_without_disruptions() {
    let store = Arc::new(MemoryStore::new());
    let covered = store.insert_flight(flight("N550BA", "KTEB", "KLAX")).await.unwrap();
    store.insert_flight(flight("N550BB", "KTEB", "KJFK")).await.unwrap();
    let a = rested_crew(&store, "Capt. Ortiz").await;
    let b = rested_crew(&store, "FO Lindqvist").await;
    let monitor = monitor_with(store.clone(), foggy_klax());
    monitor
        .backups()
        .create_plan_at(
            covered.id,
            BackupPlanDraft {
                crew_ids: vec![a.id, b.id],
                aircraft_id: "N550BC".into(),
                fallback_airport: None,
                priority: None,
                rationale: None,
            },
            t0(),
        )
        .await
        .unwrap();

    let report = monitor.trigger_check_at(t0()).await.unwrap();
    assert_eq!(report.sweep.flights_checked, 2);
    assert!(report.sweep.suggestions.is_empty());
}

#[tokio::test]
async fn sweep_refreshes_non_compliant_crew() {
    let store = Arc::new(MemoryStore::new());
    let pilot = rested_crew(&store, "Capt. Ortiz").await;
    store
        .insert_duty_record(DutyRecord::duty(
            pilot.id,
            None,
            t0() - Duration::hours(11),
            t0() - Duration::minutes(30),
        ))
        .await
        .unwrap();
    store
        .insert_flight(flight("N550BA", "KJFK", "KSFO").with_crew(vec![pilot.id]))
        .await
        .unwrap();
    let monitor = monitor_with(store.clone(), StaticWeather::new());

    let report = monitor.sweep_at(t0()).await.unwrap();
    assert_eq!(report.crew_checked, 1);

    let cached = store.get_crew(pilot.id).await.unwrap().unwrap();
    assert!((cached.current_duty - 10.5).abs() < 1e-9);
}

#[tokio::test]
async fn sweep_collects_per_flight_failures() {
    let store = Arc::new(MemoryStore::new());
    store.insert_flight(flight("N550BA", "KTEB", "KLAX")).await.unwrap();
    let monitor = monitor_with(store.clone(), foggy_klax());
    monitor.trigger_check_at(t0()).await.unwrap();

    store.inject_failure(StoreOp::ListBackups);
    let report = monitor.sweep_at(t0()).await.unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.errors.len(), 1);

    store.clear_failures();
    store.inject_failure(StoreOp::ListFlights);
    let err = monitor.sweep_at(t0()).await.unwrap_err();
    assert!(matches!(err, MonitorError::Store(_)));
}

// ── Notifications ────────────────────────────────────────────

#[tokio::test]
async fn new_alerts_are_dispatched_once() {
    let store = Arc::new(MemoryStore::new());
    store.insert_flight(flight("N550BA", "KTEB", "KLAX")).await.unwrap();
    let sent = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::with_defaults(vec![Box::new(CountingNotifier {
        sent: sent.clone(),
    })]);
    let monitor = monitor_with(store, foggy_klax()).with_dispatcher(Arc::new(dispatcher));

    monitor.trigger_check_at(t0()).await.unwrap();
    monitor.trigger_check_at(t0() + Duration::minutes(1)).await.unwrap();
    assert_eq!(sent.load(Ordering::SeqCst), 1);
}

// ── Commands and reads ───────────────────────────────────────

#[tokio::test]
async fn resolve_unknown_alert_is_not_found() {
    let monitor = monitor_with(Arc::new(MemoryStore::new()), StaticWeather::new());
    let err = monitor.resolve_alert(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, MonitorError::AlertNotFound(_)));
}

#[tokio::test]
async fn status_counts() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_crew(CrewMember::new("FO Banks").with_rest_compliant(false))
        .await
        .unwrap();
    store.insert_crew(CrewMember::new("Capt. Ortiz")).await.unwrap();
    store.insert_flight(flight("N550BA", "KTEB", "KLAX")).await.unwrap();
    let mut done = flight("N550BB", "KTEB", "KJFK");
    done.status = FlightStatus::Completed;
    store.insert_flight(done).await.unwrap();
    let monitor = monitor_with(store, foggy_klax());

    let before = monitor.status().await.unwrap();
    assert!(!before.is_running);
    assert!(before.last_check_time.is_none());
    assert_eq!(before.active_alert_count, 0);
    assert_eq!(before.monitored_flight_count, 1);
    assert_eq!(before.non_compliant_crew_count, 1);

    monitor.trigger_check_at(t0()).await.unwrap();
    let after = monitor.status().await.unwrap();
    assert_eq!(after.last_check_time, Some(t0()));
    assert_eq!(after.active_alert_count, 1);
}

#[tokio::test]
async fn summary_orders_by_severity() {
    let store = Arc::new(MemoryStore::new());
    let quiet = store.insert_flight(flight("N550BA", "KTEB", "KJFK")).await.unwrap();
    let foggy = store.insert_flight(flight("N550BB", "KTEB", "KLAX")).await.unwrap();
    let broken = store.insert_flight(flight("N550BC", "KTEB", "KJFK")).await.unwrap();
    let monitor = monitor_with(store, foggy_klax());

    monitor.trigger_check_at(t0()).await.unwrap();
    monitor
        .detector()
        .submit_alert_at(
            NewAlert::new(broken.id, AlertKind::Mechanical, "Hydraulic leak"),
            t0(),
        )
        .await
        .unwrap();

    let summary = monitor.summary_at(t0()).await.unwrap();
    let order: Vec<_> = summary.iter().map(|s| (s.flight_id, s.severity)).collect();
    assert_eq!(
        order,
        vec![
            (broken.id, Severity::Critical),
            (foggy.id, Severity::Medium),
            (quiet.id, Severity::Low),
        ]
    );
    assert_eq!(summary[0].status, FlightStatus::Delayed);
}

#[tokio::test]
async fn summary_lists_crew_violations() {
    let store = Arc::new(MemoryStore::new());
    let tired = store.insert_crew(CrewMember::new("FO Banks")).await.unwrap();
    store
        .insert_flight(flight("N550BA", "KJFK", "KSFO").with_crew(vec![tired.id]))
        .await
        .unwrap();
    let monitor = monitor_with(store, StaticWeather::new());

    let summary = monitor.summary_at(t0()).await.unwrap();
    assert_eq!(summary[0].crew_issues, vec!["Insufficient rest period".to_string()]);
    assert_eq!(summary[0].severity, Severity::High);
}

#[tokio::test]
async fn flight_details_collects_everything() {
    let store = Arc::new(MemoryStore::new());
    let a = rested_crew(&store, "Capt. Ortiz").await;
    rested_crew(&store, "FO Lindqvist").await;
    rested_crew(&store, "FO Okafor").await;
    let f = store
        .insert_flight(flight("N550BA", "KTEB", "KLAX").with_crew(vec![a.id]))
        .await
        .unwrap();
    let monitor = monitor_with(store, foggy_klax());
    monitor.trigger_check_at(t0()).await.unwrap();

    let details = monitor.flight_details(f.id).await.unwrap();
    assert_eq!(details.flight.id, f.id);
    assert_eq!(details.crew_compliance.len(), 1);
    assert!(details.backup_plans.is_empty());
    assert_eq!(details.suggestions.len(), 3);
    assert!(details.suggestions.iter().all(|d| !d.crew_ids.contains(&a.id)));
    assert!(details.alerts.iter().any(|a| a.kind == AlertKind::Weather));
    assert!(!details.activity.is_empty());

    let missing = monitor.flight_details(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, MonitorError::FlightNotFound(_)));
}
