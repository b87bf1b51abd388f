use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Flight, Schedule};
use crate::repository::{FlightRepository, ScheduleRepository};
use crate::{CoreError, CoreResult};

/// Sort token selecting flight-number ascending order.
pub const SORT_ASCENDING: &str = "asc";

/// Read-only flight and schedule lookups
pub struct FlightService {
    flights: Arc<dyn FlightRepository>,
    schedules: Arc<dyn ScheduleRepository>,
}

impl FlightService {
    pub fn new(flights: Arc<dyn FlightRepository>, schedules: Arc<dyn ScheduleRepository>) -> Self {
        Self { flights, schedules }
    }

    /// All flights; ordered by flight number when `sort_order` is `"asc"`,
    /// storage order otherwise.
    pub async fn list_flights(&self, sort_order: Option<&str>) -> CoreResult<Vec<Flight>> {
        let flights = match sort_order {
            Some(order) if order.eq_ignore_ascii_case(SORT_ASCENDING) => {
                self.flights.find_all_ordered_by_number_asc().await?
            }
            _ => self.flights.find_all().await?,
        };
        debug!(count = flights.len(), sort = ?sort_order, "Listed flights");
        Ok(flights)
    }

    pub async fn get_flight(&self, id: Uuid) -> CoreResult<Flight> {
        self.flights
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Flight", id))
    }

    /// Schedules of a flight departing strictly after `after`, or after now when
    /// no bound is given.
    pub async fn list_flight_schedules(
        &self,
        flight_id: Uuid,
        after: Option<&str>,
    ) -> CoreResult<Vec<Schedule>> {
        let lower_bound = match after {
            Some(raw) => parse_departure_bound(raw)?,
            None => Utc::now(),
        };

        let schedules = self
            .schedules
            .find_by_flight_departing_after(flight_id, lower_bound)
            .await?;
        debug!(%flight_id, %lower_bound, count = schedules.len(), "Listed flight schedules");
        Ok(schedules)
    }
}

/// Parses a departure filter. Accepts RFC 3339 (`2025-05-10T10:00:00+02:00`) or
/// an ISO local date-time (`2025-05-10T10:00:00`), the latter read as UTC.
pub fn parse_departure_bound(raw: &str) -> CoreResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    raw.parse::<NaiveDateTime>()
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|source| CoreError::InvalidTimestamp {
            input: raw.to_string(),
            source,
        })
}
