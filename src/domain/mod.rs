pub mod purchase;
pub mod repositories;
pub mod reservation;
pub mod seat;
pub mod waiting_room;

// Re-export commonly used types
pub use purchase::{PaymentDetails, Purchase, PurchaseRepository, Ticket};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{Reservation, ReservationRepository, ReservationStatus};
pub use seat::{Seat, SeatRepository, SeatStatus};
pub use waiting_room::{AdmissionState, AdmissionStatus};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::DomainError;
