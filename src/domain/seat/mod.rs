//! Seat aggregate
//!
//! Contains the Seat entity, its hold state, and the repository interface.

pub mod model;
pub mod repository;

pub use model::{Seat, SeatStatus};
pub use repository::SeatRepository;
