//! Database entities module

pub mod purchase;
pub mod reservation;
pub mod seat;
pub mod ticket;

pub use purchase::Entity as Purchase;
pub use reservation::Entity as Reservation;
pub use seat::Entity as Seat;
pub use ticket::Entity as Ticket;
