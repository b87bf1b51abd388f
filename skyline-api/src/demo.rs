use chrono::{Duration, DurationRound, Utc};
use skyline_core::memory::InMemoryStore;
use skyline_core::models::{Flight, Schedule};

const DEMO_SEATS: i32 = 180;

/// Fills an empty in-memory store with a small timetable: three routes, each
/// departing daily for the next week.
pub fn seed_demo_data(store: &InMemoryStore) {
    let routes = [
        Flight::new("SK310", "LHR", "JFK", 470),
        Flight::new("SK104", "CDG", "FRA", 75),
        Flight::new("SK227", "SIN", "HND", 410),
    ];

    let midnight = Utc::now()
        .duration_trunc(Duration::days(1))
        .unwrap_or_else(|_| Utc::now());

    for (slot, flight) in routes.into_iter().enumerate() {
        let first_departure = midnight + Duration::hours(8 + 3 * slot as i64);
        for day in 1..=7 {
            let departure = first_departure + Duration::days(day);
            let arrival = departure + Duration::minutes(flight.duration_minutes as i64);
            store.insert_schedule(Schedule::new(flight.id, departure, arrival, DEMO_SEATS));
        }
        store.insert_flight(flight);
    }

    tracing::info!("Seeded in-memory store with demo timetable");
}
