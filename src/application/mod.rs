pub mod booking;
pub mod waiting_room;

// Re-export key types for convenience
pub use booking::{
    start_reservation_expiry_task, Checkout, EventLocks, ReservationDetails, ReservationService,
    ReservationSettings, SeatMapLayout, SeatMapService, SectionLayout, TicketService,
    TicketWithSeat,
};
pub use waiting_room::{AdmissionConfig, AdmissionQueue};
