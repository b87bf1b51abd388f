//! In-memory implementation of every repository trait.
//!
//! Backs the unit and API tests and the server when no database is configured.
//! Transactions stage their writes and apply them under one lock on commit, after
//! re-checking every staged version against the live tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::models::{Flight, Schedule, Ticket};
use crate::repository::{
    BookingTransaction, BookingUnitOfWork, FlightRepository, RepoResult, RepositoryError,
    ScheduleRepository, TicketRepository,
};

#[derive(Debug, Default)]
struct Tables {
    flights: Vec<Flight>, // insertion order is the storage order
    schedules: HashMap<Uuid, Schedule>,
    tickets: HashMap<Uuid, Ticket>,
}

fn lock(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    #[cfg(test)]
    fail_ticket_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flight, replacing any flight with the same id in place.
    pub fn insert_flight(&self, flight: Flight) {
        let mut tables = lock(&self.tables);
        match tables.flights.iter_mut().find(|f| f.id == flight.id) {
            Some(existing) => *existing = flight,
            None => tables.flights.push(flight),
        }
    }

    pub fn insert_schedule(&self, schedule: Schedule) {
        lock(&self.tables).schedules.insert(schedule.id, schedule);
    }

    /// Seeds an already-booked ticket. Stored tickets always have version >= 1.
    pub fn insert_ticket(&self, mut ticket: Ticket) {
        ticket.version = ticket.version.max(1);
        lock(&self.tables).tickets.insert(ticket.id, ticket);
    }

    /// Makes every subsequent ticket write fail with a backend error.
    #[cfg(test)]
    pub(crate) fn set_fail_ticket_writes(&self, fail: bool) {
        self.fail_ticket_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FlightRepository for InMemoryStore {
    async fn find_all(&self) -> RepoResult<Vec<Flight>> {
        Ok(lock(&self.tables).flights.clone())
    }

    async fn find_all_ordered_by_number_asc(&self) -> RepoResult<Vec<Flight>> {
        let mut flights = lock(&self.tables).flights.clone();
        flights.sort_by(|a, b| a.flight_number.cmp(&b.flight_number));
        Ok(flights)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Flight>> {
        Ok(lock(&self.tables).flights.iter().find(|f| f.id == id).cloned())
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Schedule>> {
        Ok(lock(&self.tables).schedules.get(&id).cloned())
    }

    async fn find_by_flight_departing_after(
        &self,
        flight_id: Uuid,
        after: DateTime<Utc>,
    ) -> RepoResult<Vec<Schedule>> {
        let mut schedules: Vec<Schedule> = lock(&self.tables)
            .schedules
            .values()
            .filter(|s| s.flight_id == flight_id && s.departure_time > after)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.departure_time);
        Ok(schedules)
    }
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Ticket>> {
        Ok(lock(&self.tables).tickets.get(&id).cloned())
    }
}

#[async_trait]
impl BookingUnitOfWork for InMemoryStore {
    async fn begin(&self) -> RepoResult<Box<dyn BookingTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            tables: Arc::clone(&self.tables),
            #[cfg(test)]
            fail_ticket_writes: Arc::clone(&self.fail_ticket_writes),
            schedules: Vec::new(),
            tickets: Vec::new(),
        }))
    }
}

/// Staged writes, each paired with the version it expects to find in storage
/// (`None` for a ticket insert).
pub struct InMemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    #[cfg(test)]
    fail_ticket_writes: Arc<AtomicBool>,
    schedules: Vec<(i64, Schedule)>,
    tickets: Vec<(Option<i64>, Ticket)>,
}

impl InMemoryTransaction {
    #[cfg(test)]
    fn ticket_writes_failing(&self) -> bool {
        self.fail_ticket_writes.load(Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn ticket_writes_failing(&self) -> bool {
        false
    }

    fn visible_schedule_version(&self, id: Uuid) -> Option<i64> {
        self.schedules
            .iter()
            .rev()
            .find(|(_, s)| s.id == id)
            .map(|(_, s)| s.version)
            .or_else(|| lock(&self.tables).schedules.get(&id).map(|s| s.version))
    }

    fn visible_ticket_version(&self, id: Uuid) -> Option<i64> {
        self.tickets
            .iter()
            .rev()
            .find(|(_, t)| t.id == id)
            .map(|(_, t)| t.version)
            .or_else(|| lock(&self.tables).tickets.get(&id).map(|t| t.version))
    }

    fn stage_schedule(&mut self, schedule: &Schedule) -> RepoResult<Schedule> {
        match self.visible_schedule_version(schedule.id) {
            None => Err(RepositoryError::backend(format!(
                "Schedule {} does not exist",
                schedule.id
            ))),
            Some(current) if current != schedule.version => Err(RepositoryError::Conflict {
                entity: "Schedule",
                id: schedule.id,
            }),
            Some(_) => {
                let mut saved = schedule.clone();
                saved.version += 1;
                self.schedules.push((schedule.version, saved.clone()));
                Ok(saved)
            }
        }
    }

    fn stage_ticket(&mut self, ticket: &Ticket) -> RepoResult<Ticket> {
        if self.ticket_writes_failing() {
            return Err(RepositoryError::backend("ticket store unavailable"));
        }

        let current = self.visible_ticket_version(ticket.id);
        let expected = if ticket.is_new() {
            if current.is_some() {
                return Err(RepositoryError::backend(format!(
                    "Ticket {} already exists",
                    ticket.id
                )));
            }
            None
        } else {
            match current {
                None => {
                    return Err(RepositoryError::backend(format!(
                        "Ticket {} does not exist",
                        ticket.id
                    )))
                }
                Some(v) if v != ticket.version => {
                    return Err(RepositoryError::Conflict {
                        entity: "Ticket",
                        id: ticket.id,
                    })
                }
                Some(v) => Some(v),
            }
        };

        let mut saved = ticket.clone();
        saved.version += 1;
        self.tickets.push((expected, saved.clone()));
        Ok(saved)
    }

    fn apply(self) -> RepoResult<()> {
        let mut tables = lock(&self.tables);

        // Re-validate against the live tables; another transaction may have
        // committed since the writes were staged.
        let mut schedule_versions: HashMap<Uuid, i64> = HashMap::new();
        for (expected, saved) in &self.schedules {
            let current = schedule_versions
                .get(&saved.id)
                .copied()
                .or_else(|| tables.schedules.get(&saved.id).map(|s| s.version));
            if current != Some(*expected) {
                return Err(RepositoryError::Conflict {
                    entity: "Schedule",
                    id: saved.id,
                });
            }
            schedule_versions.insert(saved.id, saved.version);
        }

        let mut ticket_versions: HashMap<Uuid, i64> = HashMap::new();
        for (expected, saved) in &self.tickets {
            let current = ticket_versions
                .get(&saved.id)
                .copied()
                .or_else(|| tables.tickets.get(&saved.id).map(|t| t.version));
            if current != *expected {
                return Err(RepositoryError::Conflict {
                    entity: "Ticket",
                    id: saved.id,
                });
            }
            ticket_versions.insert(saved.id, saved.version);
        }

        for (_, schedule) in self.schedules {
            tables.schedules.insert(schedule.id, schedule);
        }
        for (_, ticket) in self.tickets {
            tables.tickets.insert(ticket.id, ticket);
        }
        Ok(())
    }
}

#[async_trait]
impl BookingTransaction for InMemoryTransaction {
    async fn save_schedule(&mut self, schedule: &Schedule) -> RepoResult<Schedule> {
        self.stage_schedule(schedule)
    }

    async fn save_ticket(&mut self, ticket: &Ticket) -> RepoResult<Ticket> {
        self.stage_ticket(ticket)
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        (*self).apply()
    }
}
