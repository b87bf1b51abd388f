use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skyline_core::models::Schedule;
use skyline_core::repository::{RepoResult, RepositoryError, ScheduleRepository};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresScheduleRepository {
    pool: PgPool,
}

impl PostgresScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    flight_id: Uuid,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    available_seats: i32,
    version: i64,
}

impl From<ScheduleRow> for Schedule {
    fn from(row: ScheduleRow) -> Self {
        Schedule {
            id: row.id,
            flight_id: row.flight_id,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            available_seats: row.available_seats,
            version: row.version,
        }
    }
}

#[async_trait]
impl ScheduleRepository for PostgresScheduleRepository {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Schedule>> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, flight_id, departure_time, arrival_time, available_seats, version
            FROM schedules
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        Ok(row.map(Schedule::from))
    }

    async fn find_by_flight_departing_after(
        &self,
        flight_id: Uuid,
        after: DateTime<Utc>,
    ) -> RepoResult<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, flight_id, departure_time, arrival_time, available_seats, version
            FROM schedules
            WHERE flight_id = $1 AND departure_time > $2
            ORDER BY departure_time ASC
            "#,
        )
        .bind(flight_id)
        .bind(after)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        Ok(rows.into_iter().map(Schedule::from).collect())
    }
}
