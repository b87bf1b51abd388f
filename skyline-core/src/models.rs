use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// A flight on the timetable. Departures are modelled separately as [`Schedule`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub origin: String,      // IATA code
    pub destination: String, // IATA code
    pub duration_minutes: i32,
}

impl Flight {
    pub fn new(
        flight_number: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        duration_minutes: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_number: flight_number.into(),
            origin: origin.into(),
            destination: destination.into(),
            duration_minutes,
        }
    }
}

/// A single departure of a flight, carrying the remaining seat inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: i32,
    /// Optimistic concurrency token, bumped by the store on every save.
    pub version: i64,
}

impl Schedule {
    pub fn new(
        flight_id: Uuid,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
        available_seats: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_id,
            departure_time,
            arrival_time,
            available_seats,
            version: 0,
        }
    }

    pub fn has_available_seat(&self) -> bool {
        self.available_seats > 0
    }

    /// Consume one seat. Only called together with ticket creation.
    pub(crate) fn take_seat(&mut self) -> CoreResult<()> {
        if !self.has_available_seat() {
            return Err(CoreError::ValidationError(format!(
                "No seats available on schedule {}",
                self.id
            )));
        }
        self.available_seats -= 1;
        Ok(())
    }

    /// Give back the seat held by a cancelled ticket.
    pub(crate) fn release_seat(&mut self) {
        self.available_seats += 1;
    }
}

/// Ticket lifecycle: `Booked` -> `Cancelled`. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Booked,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Booked => "BOOKED",
            TicketStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown ticket status: {0}")]
pub struct UnknownTicketStatus(pub String);

impl FromStr for TicketStatus {
    type Err = UnknownTicketStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOKED" => Ok(TicketStatus::Booked),
            "CANCELLED" => Ok(TicketStatus::Cancelled),
            other => Err(UnknownTicketStatus(other.to_string())),
        }
    }
}

/// A passenger's booking against one schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    pub id: Uuid,
    pub schedule_id: Uuid, // never rewritten after booking
    pub passenger_name: String,
    pub passenger_email: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Ticket {
    /// A fresh, not yet persisted ticket in the `Booked` state.
    pub fn book(
        schedule_id: Uuid,
        passenger_name: impl Into<String>,
        passenger_email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            schedule_id,
            passenger_name: passenger_name.into(),
            passenger_email: passenger_email.into(),
            status: TicketStatus::Booked,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// True until the store has saved the ticket once.
    pub fn is_new(&self) -> bool {
        self.version == 0
    }

    /// Transition: Booked -> Cancelled
    pub(crate) fn cancel(&mut self) -> CoreResult<()> {
        if self.status == TicketStatus::Cancelled {
            return Err(CoreError::ValidationError(format!(
                "Ticket {} is already cancelled",
                self.id
            )));
        }
        self.status = TicketStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Inbound booking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRequest {
    pub schedule_id: Uuid,
    pub passenger_name: String,
    pub passenger_email: String,
}
