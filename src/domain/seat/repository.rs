//! Seat repository interface
//!
//! State changes are conditional updates over a seat id set: each one only
//! applies to seats in the expected prior state and is all-or-nothing where
//! noted. This is what keeps a seat from ever having two holders, even when
//! several processes share one database.

use async_trait::async_trait;

use super::model::Seat;
use crate::domain::DomainResult;

#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// All seats of an event, ordered by section, row and number
    async fn find_by_event(&self, event_id: &str) -> DomainResult<Vec<Seat>>;

    /// Seats with the given ids (unknown ids are skipped)
    async fn find_by_ids(&self, seat_ids: &[String]) -> DomainResult<Vec<Seat>>;

    async fn count_by_event(&self, event_id: &str) -> DomainResult<u64>;

    async fn insert_many(&self, seats: Vec<Seat>) -> DomainResult<()>;

    /// available -> reserved for every seat, all or nothing.
    ///
    /// Fails with `SeatUnavailable` listing the seats that were not
    /// available, or `Validation` if a seat does not belong to `event_id`.
    async fn claim(
        &self,
        event_id: &str,
        seat_ids: &[String],
        reservation_id: &str,
    ) -> DomainResult<()>;

    /// reserved -> available for seats held by `reservation_id`.
    /// Seats held by anyone else are left untouched. Returns how many
    /// seats were released.
    async fn release(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<u64>;

    /// reserved -> sold for every seat, all or nothing; each seat must be
    /// held by `reservation_id`.
    async fn sell(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<()>;

    /// sold -> available for seats sold to `reservation_id`. Undo path for a
    /// checkout that could not be completed.
    async fn unsell(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<u64>;
}
