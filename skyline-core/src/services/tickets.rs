use skyline_shared::pii::mask_email;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Ticket, TicketRequest};
use crate::repository::{BookingUnitOfWork, ScheduleRepository, TicketRepository};
use crate::validation::{validate_passenger_email, validate_passenger_name};
use crate::{CoreError, CoreResult};

/// Books and cancels tickets against schedule seat inventory.
///
/// The seat counter and the ticket status only change together: each operation
/// stages both writes in one [`BookingUnitOfWork`] transaction and commits once.
pub struct TicketService {
    schedules: Arc<dyn ScheduleRepository>,
    tickets: Arc<dyn TicketRepository>,
    unit_of_work: Arc<dyn BookingUnitOfWork>,
}

impl TicketService {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        tickets: Arc<dyn TicketRepository>,
        unit_of_work: Arc<dyn BookingUnitOfWork>,
    ) -> Self {
        Self {
            schedules,
            tickets,
            unit_of_work,
        }
    }

    /// Books one seat on the requested schedule.
    ///
    /// Fails with `NotFound` for an unknown schedule and `ValidationError` for a
    /// malformed email, a blank name or a sold-out schedule.
    pub async fn create_ticket(&self, request: TicketRequest) -> CoreResult<Ticket> {
        let mut schedule = self
            .schedules
            .find_by_id(request.schedule_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Schedule", request.schedule_id))?;

        validate_passenger_email(&request.passenger_email)?;
        validate_passenger_name(&request.passenger_name)?;

        if let Err(e) = schedule.take_seat() {
            warn!(schedule_id = %schedule.id, "Booking rejected: schedule sold out");
            return Err(e);
        }

        let ticket = Ticket::book(schedule.id, request.passenger_name, request.passenger_email);

        let mut tx = self.unit_of_work.begin().await?;
        let schedule = tx.save_schedule(&schedule).await?;
        let ticket = tx.save_ticket(&ticket).await?;
        tx.commit().await?;

        info!(
            ticket_id = %ticket.id,
            schedule_id = %schedule.id,
            seats_left = schedule.available_seats,
            passenger = %mask_email(&ticket.passenger_email),
            "Ticket booked"
        );
        Ok(ticket)
    }

    pub async fn get_ticket(&self, id: Uuid) -> CoreResult<Ticket> {
        self.tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Ticket", id))
    }

    /// Cancels a booked ticket and returns its seat to the schedule.
    ///
    /// Cancelling twice is an error, not a no-op.
    pub async fn cancel_ticket(&self, id: Uuid) -> CoreResult<Ticket> {
        let mut ticket = self.get_ticket(id).await?;
        ticket.cancel()?;

        let mut schedule = self
            .schedules
            .find_by_id(ticket.schedule_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Schedule", ticket.schedule_id))?;
        schedule.release_seat();

        let mut tx = self.unit_of_work.begin().await?;
        let ticket = tx.save_ticket(&ticket).await?;
        let schedule = tx.save_schedule(&schedule).await?;
        tx.commit().await?;

        info!(
            ticket_id = %ticket.id,
            schedule_id = %schedule.id,
            seats_left = schedule.available_seats,
            "Ticket cancelled"
        );
        Ok(ticket)
    }
}
