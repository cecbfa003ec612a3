//! In-memory repository implementations

mod memory;

pub use memory::{
    InMemoryPurchaseRepository, InMemoryRepositoryProvider, InMemoryReservationRepository,
    InMemorySeatRepository,
};
