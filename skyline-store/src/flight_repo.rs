use async_trait::async_trait;
use skyline_core::models::Flight;
use skyline_core::repository::{FlightRepository, RepoResult, RepositoryError};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresFlightRepository {
    pool: PgPool,
}

impl PostgresFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    origin: String,
    destination: String,
    duration_minutes: i32,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            flight_number: row.flight_number,
            origin: row.origin,
            destination: row.destination,
            duration_minutes: row.duration_minutes,
        }
    }
}

const SELECT_FLIGHTS: &str =
    "SELECT id, flight_number, origin, destination, duration_minutes FROM flights";

#[async_trait]
impl FlightRepository for PostgresFlightRepository {
    async fn find_all(&self) -> RepoResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(SELECT_FLIGHTS)
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn find_all_ordered_by_number_asc(&self) -> RepoResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!("{} ORDER BY flight_number ASC", SELECT_FLIGHTS))
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Flight>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!("{} WHERE id = $1", SELECT_FLIGHTS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        Ok(row.map(Flight::from))
    }
}
