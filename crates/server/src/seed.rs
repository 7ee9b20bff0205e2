//! Demo fleet for local runs against the in-memory store.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use charterops_core::{CrewMember, DutyRecord, Flight};
use charterops_storage::{Store, StoreError};

/// Three flights over the demo weather airports and five crew, one of
/// them close to the duty limit and one still resting.
pub async fn seed_demo(store: &dyn Store, now: DateTime<Utc>) -> Result<(), StoreError> {
    let mut crew = Vec::new();
    for (name, duty_hours) in [
        ("Capt. Elena Ortiz", 2.0),
        ("FO Marcus Lindqvist", 3.5),
        ("Capt. Dana Whitfield", 9.5),
        ("FO Priya Okafor", 0.0),
    ] {
        let member = store
            .insert_crew(CrewMember::new(name).with_duty(duty_hours))
            .await?;
        store
            .insert_duty_record(DutyRecord::completed_rest(
                member.id,
                now - Duration::hours(26),
                now - Duration::hours(14),
            ))
            .await?;
        if duty_hours > 0.0 {
            let span = Duration::minutes((duty_hours * 60.0) as i64);
            store
                .insert_duty_record(DutyRecord::duty(member.id, None, now - span, now))
                .await?;
        }
        crew.push(member);
    }

    let resting = store
        .insert_crew(CrewMember::new("FO Sam Reyes").with_rest_compliant(false))
        .await?;
    store
        .insert_duty_record(DutyRecord::open_rest(resting.id, now - Duration::hours(4)))
        .await?;

    let flights = [
        Flight::new("N550BA", "KTEB", "KLAX", now + Duration::hours(2), now + Duration::hours(7))
            .with_crew(vec![crew[0].id, crew[1].id]),
        Flight::new("N550BB", "KJFK", "KTEB", now + Duration::hours(4), now + Duration::hours(5))
            .with_crew(vec![crew[2].id]),
        Flight::new("N550BC", "KTEB", "KJFK", now + Duration::hours(6), now + Duration::hours(7))
            .with_crew(vec![crew[3].id, resting.id]),
    ];
    for flight in flights {
        store.insert_flight(flight).await?;
    }

    info!(crew = crew.len() + 1, flights = 3, "demo data seeded");
    Ok(())
}
