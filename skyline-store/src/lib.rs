pub mod app_config;
pub mod database;
pub mod flight_repo;
pub mod schedule_repo;
pub mod ticket_repo;
pub mod redis_repo;

pub use database::DbClient;
pub use flight_repo::PostgresFlightRepository;
pub use redis_repo::RedisClient;
pub use schedule_repo::PostgresScheduleRepository;
pub use ticket_repo::{PostgresBookingUnitOfWork, PostgresTicketRepository};
