//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::purchase::PurchaseRepository;
use super::reservation::ReservationRepository;
use super::seat::SeatRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) -> DomainResult<()> {
///     let seats = repos.seats().find_by_event("EV-1").await?;
///     let hold = repos.reservations().find_by_id("R-1").await?;
///     Ok(())
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn seats(&self) -> &dyn SeatRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn purchases(&self) -> &dyn PurchaseRepository;
}
