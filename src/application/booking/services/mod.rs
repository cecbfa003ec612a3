//! Booking services

mod event_locks;
mod reservation;
mod reservation_expiry;
mod seat_map;
mod tickets;

pub use event_locks::EventLocks;
pub use reservation::{
    Checkout, ReservationDetails, ReservationService, ReservationSettings, DEFAULT_HOLD_MINUTES,
    DEFAULT_SERVICE_FEE_PERCENT,
};
pub use reservation_expiry::start_reservation_expiry_task;
pub use seat_map::{SeatMapLayout, SeatMapService, SectionLayout};
pub use tickets::{TicketService, TicketWithSeat};
