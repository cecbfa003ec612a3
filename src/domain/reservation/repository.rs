//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Reservation, ReservationStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Save a new reservation
    async fn save(&self, reservation: Reservation) -> DomainResult<()>;

    /// Find reservation by ID
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>>;

    /// Move a reservation from `from` to `to`.
    ///
    /// Returns `false` without changing anything if the stored status is not
    /// `from`; errors with `ReservationNotFound` for unknown ids.
    async fn transition(
        &self,
        id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<bool>;

    /// Active reservations whose expiry is before `now`
    async fn find_overdue(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>>;
}
