use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Seats no longer available: {}", seat_ids.join(", "))]
    SeatUnavailable { seat_ids: Vec<String> },

    #[error("Reservation {0} not found")]
    ReservationNotFound(String),

    #[error("Reservation {id} is not active (status: {status})")]
    ReservationNotActive { id: String, status: String },

    #[error("Reservation {0} has expired")]
    ReservationExpired(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl DomainError {
    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::StorageUnavailable(_))
    }

    pub fn reservation_not_active(id: impl Into<String>, status: impl ToString) -> Self {
        DomainError::ReservationNotActive {
            id: id.into(),
            status: status.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<InfraError> for DomainError {
    fn from(err: InfraError) -> Self {
        DomainError::StorageUnavailable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Infra(InfraError::Database(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Infra(InfraError::Io(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_transient() {
        assert!(DomainError::StorageUnavailable("timeout".into()).is_transient());
        assert!(!DomainError::Validation("bad".into()).is_transient());
        assert!(!DomainError::SeatUnavailable { seat_ids: vec![] }.is_transient());
    }

    #[test]
    fn seat_unavailable_lists_conflicts() {
        let err = DomainError::SeatUnavailable {
            seat_ids: vec!["s-1".into(), "s-2".into()],
        };
        assert_eq!(err.to_string(), "Seats no longer available: s-1, s-2");
    }

    #[test]
    fn infra_errors_surface_as_storage_unavailable() {
        let err: DomainError = InfraError::Config("broken".into()).into();
        assert!(matches!(err, DomainError::StorageUnavailable(_)));
    }
}
