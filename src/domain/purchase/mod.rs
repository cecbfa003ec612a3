//! Purchase aggregate
//!
//! A purchase is the outcome of a finalized reservation; it owns one ticket
//! per sold seat.

pub mod model;
pub mod repository;

pub use model::{
    total_with_service_fee, PaymentDetails, PaymentStatus, Purchase, Ticket, TicketStatus,
    DEFAULT_PAYMENT_METHOD,
};
pub use repository::PurchaseRepository;
