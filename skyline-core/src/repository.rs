use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Flight, Schedule, Ticket};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The stored version no longer matches the one that was read.
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: &'static str, id: Uuid },
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        RepositoryError::Backend(err.into())
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository trait for flight data access
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// All flights in storage order.
    async fn find_all(&self) -> RepoResult<Vec<Flight>>;

    async fn find_all_ordered_by_number_asc(&self) -> RepoResult<Vec<Flight>>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Flight>>;
}

/// Repository trait for schedule data access
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Schedule>>;

    /// Schedules of `flight_id` departing strictly after `after`, earliest first.
    async fn find_by_flight_departing_after(
        &self,
        flight_id: Uuid,
        after: DateTime<Utc>,
    ) -> RepoResult<Vec<Schedule>>;
}

/// Repository trait for ticket data access
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Ticket>>;
}

/// Opens the transaction that seat and ticket writes go through.
#[async_trait]
pub trait BookingUnitOfWork: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn BookingTransaction>>;
}

/// Writes staged here become visible together on `commit`, or not at all.
///
/// Both saves are version-checked: the write only applies if the stored version
/// equals the one on the passed entity, and the returned copy carries the bumped
/// version. Dropping the transaction without committing discards everything.
#[async_trait]
pub trait BookingTransaction: Send {
    async fn save_schedule(&mut self, schedule: &Schedule) -> RepoResult<Schedule>;

    /// Inserts when [`Ticket::is_new`], otherwise updates.
    async fn save_ticket(&mut self, ticket: &Ticket) -> RepoResult<Ticket>;

    async fn commit(self: Box<Self>) -> RepoResult<()>;
}
