use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skyline_core::models::{Schedule, Ticket, TicketStatus};
use skyline_core::repository::{
    BookingTransaction, BookingUnitOfWork, RepoResult, RepositoryError, TicketRepository,
};
use sqlx::{PgPool, Postgres};
use tracing::warn;
use uuid::Uuid;

pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    schedule_id: Uuid,
    passenger_name: String,
    passenger_email: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = RepositoryError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status: TicketStatus = row.status.parse().map_err(RepositoryError::backend)?;
        Ok(Ticket {
            id: row.id,
            schedule_id: row.schedule_id,
            passenger_name: row.passenger_name,
            passenger_email: row.passenger_email,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, schedule_id, passenger_name, passenger_email, status, created_at, updated_at, version
            FROM tickets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        row.map(Ticket::try_from).transpose()
    }
}

/// Hands out [`PgBookingTransaction`]s on the shared pool.
pub struct PostgresBookingUnitOfWork {
    pool: PgPool,
}

impl PostgresBookingUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingUnitOfWork for PostgresBookingUnitOfWork {
    async fn begin(&self) -> RepoResult<Box<dyn BookingTransaction>> {
        let tx = self.pool.begin().await.map_err(RepositoryError::backend)?;
        Ok(Box::new(PgBookingTransaction { tx }))
    }
}

/// A database transaction; rolled back by sqlx if dropped before `commit`.
pub struct PgBookingTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingTransaction for PgBookingTransaction {
    async fn save_schedule(&mut self, schedule: &Schedule) -> RepoResult<Schedule> {
        // The row lock taken by UPDATE serializes competing bookings; the version
        // predicate turns the loser's write into a no-op.
        let result = sqlx::query(
            r#"
            UPDATE schedules
            SET available_seats = $1, version = version + 1
            WHERE id = $2 AND version = $3
            "#,
        )
        .bind(schedule.available_seats)
        .bind(schedule.id)
        .bind(schedule.version)
        .execute(&mut *self.tx)
        .await
        .map_err(RepositoryError::backend)?;

        if result.rows_affected() == 0 {
            warn!(schedule_id = %schedule.id, version = schedule.version, "Stale schedule write rejected");
            return Err(RepositoryError::Conflict {
                entity: "Schedule",
                id: schedule.id,
            });
        }

        let mut saved = schedule.clone();
        saved.version += 1;
        Ok(saved)
    }

    async fn save_ticket(&mut self, ticket: &Ticket) -> RepoResult<Ticket> {
        let mut saved = ticket.clone();
        saved.version += 1;

        if ticket.is_new() {
            sqlx::query(
                r#"
                INSERT INTO tickets (id, schedule_id, passenger_name, passenger_email, status, created_at, updated_at, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(saved.id)
            .bind(saved.schedule_id)
            .bind(&saved.passenger_name)
            .bind(&saved.passenger_email)
            .bind(saved.status.as_str())
            .bind(saved.created_at)
            .bind(saved.updated_at)
            .bind(saved.version)
            .execute(&mut *self.tx)
            .await
            .map_err(RepositoryError::backend)?;

            return Ok(saved);
        }

        // Only the lifecycle columns change; schedule and passenger stay as booked.
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET status = $1, updated_at = $2, version = version + 1
            WHERE id = $3 AND version = $4
            "#,
        )
        .bind(saved.status.as_str())
        .bind(saved.updated_at)
        .bind(ticket.id)
        .bind(ticket.version)
        .execute(&mut *self.tx)
        .await
        .map_err(RepositoryError::backend)?;

        if result.rows_affected() == 0 {
            warn!(ticket_id = %ticket.id, version = ticket.version, "Stale ticket write rejected");
            return Err(RepositoryError::Conflict {
                entity: "Ticket",
                id: ticket.id,
            });
        }

        Ok(saved)
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let this = *self;
        this.tx.commit().await.map_err(RepositoryError::backend)
    }
}
