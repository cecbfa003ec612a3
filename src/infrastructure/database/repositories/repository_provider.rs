//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::purchase::PurchaseRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::seat::SeatRepository;

use super::purchase_repository::SeaOrmPurchaseRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::seat_repository::SeaOrmSeatRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let seats = repos.seats().find_by_event("EV-1").await?;
/// let hold = repos.reservations().find_by_id(&reservation_id).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    seats: SeaOrmSeatRepository,
    reservations: SeaOrmReservationRepository,
    purchases: SeaOrmPurchaseRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            seats: SeaOrmSeatRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            purchases: SeaOrmPurchaseRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn seats(&self) -> &dyn SeatRepository {
        &self.seats
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn purchases(&self) -> &dyn PurchaseRepository {
        &self.purchases
    }
}
