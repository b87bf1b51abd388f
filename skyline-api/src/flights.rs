use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyline_core::models::{Flight, Schedule};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListFlightsQuery {
    /// `asc` sorts by flight number
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SchedulesQuery {
    /// Only schedules departing after this instant; defaults to now
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlightResponse {
    pub id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub duration_minutes: i32,
}

impl From<Flight> for FlightResponse {
    fn from(flight: Flight) -> Self {
        Self {
            id: flight.id,
            flight_number: flight.flight_number,
            origin: flight.origin,
            destination: flight.destination,
            duration_minutes: flight.duration_minutes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: i32,
}

impl From<Schedule> for ScheduleResponse {
    fn from(schedule: Schedule) -> Self {
        Self {
            id: schedule.id,
            flight_id: schedule.flight_id,
            departure_time: schedule.departure_time,
            arrival_time: schedule.arrival_time,
            available_seats: schedule.available_seats,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/flights", get(list_flights))
        .route("/api/flights/{id}", get(get_flight))
        .route("/api/flights/{id}/schedules", get(list_flight_schedules))
}

/// GET /api/flights?sort=asc
async fn list_flights(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListFlightsQuery>,
) -> Result<Json<Vec<FlightResponse>>, AppError> {
    let flights = state.flights.list_flights(query.sort.as_deref()).await?;
    Ok(Json(flights.into_iter().map(FlightResponse::from).collect()))
}

/// GET /api/flights/:id
async fn get_flight(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<FlightResponse>, AppError> {
    let flight = state.flights.get_flight(id).await?;
    Ok(Json(flight.into()))
}

/// GET /api/flights/:id/schedules?date=2025-05-10T10:00:00
async fn list_flight_schedules(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<SchedulesQuery>,
) -> Result<Json<Vec<ScheduleResponse>>, AppError> {
    let schedules = state
        .flights
        .list_flight_schedules(id, query.date.as_deref())
        .await?;
    Ok(Json(schedules.into_iter().map(ScheduleResponse::from).collect()))
}
