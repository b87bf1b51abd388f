use std::sync::Arc;
use skyline_core::memory::InMemoryStore;
use skyline_core::{FlightService, TicketService};
use skyline_store::app_config::RateLimitConfig;
use skyline_store::{
    DbClient, PostgresBookingUnitOfWork, PostgresFlightRepository, PostgresScheduleRepository,
    PostgresTicketRepository, RedisClient,
};

#[derive(Clone)]
pub struct RateLimiter {
    pub redis: Arc<RedisClient>,
    pub config: RateLimitConfig,
}

#[derive(Clone)]
pub struct AppState {
    pub flights: Arc<FlightService>,
    pub tickets: Arc<TicketService>,
    pub rate_limiter: Option<RateLimiter>,
}

impl AppState {
    pub fn postgres(db: &DbClient) -> Self {
        let schedules = Arc::new(PostgresScheduleRepository::new(db.pool.clone()));

        Self {
            flights: Arc::new(FlightService::new(
                Arc::new(PostgresFlightRepository::new(db.pool.clone())),
                schedules.clone(),
            )),
            tickets: Arc::new(TicketService::new(
                schedules,
                Arc::new(PostgresTicketRepository::new(db.pool.clone())),
                Arc::new(PostgresBookingUnitOfWork::new(db.pool.clone())),
            )),
            rate_limiter: None,
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);

        Self {
            flights: Arc::new(FlightService::new(store.clone(), store.clone())),
            tickets: Arc::new(TicketService::new(store.clone(), store.clone(), store)),
            rate_limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, redis: Arc<RedisClient>, config: RateLimitConfig) -> Self {
        self.rate_limiter = Some(RateLimiter { redis, config });
        self
    }
}
