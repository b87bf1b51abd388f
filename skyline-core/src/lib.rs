pub mod models;
pub mod repository;
pub mod services;
pub mod validation;
pub mod memory;

pub use models::{Flight, Schedule, Ticket, TicketRequest, TicketStatus};
pub use repository::RepositoryError;
pub use services::{FlightService, TicketService};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found with id {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Invalid timestamp '{input}': {source}")]
    InvalidTimestamp {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { .. } => CoreError::Conflict(err.to_string()),
            RepositoryError::Backend(source) => CoreError::InternalError(source.to_string()),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
