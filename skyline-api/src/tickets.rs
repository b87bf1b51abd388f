use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyline_core::models::{Ticket, TicketRequest, TicketStatus};
use skyline_shared::pii::Masked;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct TicketResponse {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub passenger_name: String,
    pub passenger_email: Masked<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            schedule_id: ticket.schedule_id,
            passenger_name: ticket.passenger_name,
            passenger_email: Masked(ticket.passenger_email),
            status: ticket.status,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tickets", post(create_ticket))
        .route("/api/tickets/{id}", get(get_ticket))
        .route("/api/tickets/{id}/cancel", post(cancel_ticket))
}

/// POST /api/tickets
async fn create_ticket(
    State(state): State<AppState>,
    AppJson(req): AppJson<TicketRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), AppError> {
    let ticket = state.tickets.create_ticket(req).await?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

/// GET /api/tickets/:id
async fn get_ticket(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state.tickets.get_ticket(id).await?;
    Ok(Json(ticket.into()))
}

/// POST /api/tickets/:id/cancel
async fn cancel_ticket(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state.tickets.cancel_ticket(id).await?;
    Ok(Json(ticket.into()))
}
