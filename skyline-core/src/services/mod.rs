pub mod flights;
pub mod tickets;

pub use flights::FlightService;
pub use tickets::TicketService;
