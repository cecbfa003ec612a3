//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod purchase_repository;
pub mod repository_provider;
pub mod reservation_repository;
pub mod seat_repository;

pub use purchase_repository::SeaOrmPurchaseRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use reservation_repository::SeaOrmReservationRepository;
pub use seat_repository::SeaOrmSeatRepository;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::DomainError;
use crate::shared::errors::InfraError;

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::Database(e).into()
}

pub(crate) fn corrupt(entity: &str, field: &str, value: &str) -> DomainError {
    DomainError::StorageUnavailable(format!("{entity} has invalid {field}: {value}"))
}

/// Money is stored in minor units.
pub(crate) fn to_cents(amount: Decimal) -> Result<i64, DomainError> {
    (amount.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| DomainError::Validation(format!("amount {amount} out of range")))
}

pub(crate) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
pub(crate) mod test_support {
    use sea_orm::DatabaseConnection;

    use crate::infrastructure::database::{init_database, DatabaseConfig};

    /// Fresh migrated in-memory SQLite database
    pub async fn memory_db() -> DatabaseConnection {
        init_database(&DatabaseConfig::memory())
            .await
            .expect("in-memory database")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_conversion_keeps_two_decimals() {
        assert_eq!(to_cents(Decimal::new(50_000, 0)).unwrap(), 5_000_000);
        assert_eq!(to_cents(Decimal::new(1999, 2)).unwrap(), 1999);
        assert_eq!(from_cents(1999), Decimal::new(1999, 2));
    }
}
