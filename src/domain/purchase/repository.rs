//! Purchase repository interface

use async_trait::async_trait;

use super::model::{Purchase, Ticket};
use crate::domain::DomainResult;

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Insert a purchase together with its tickets; either all rows are
    /// written or none are.
    async fn record(&self, purchase: Purchase, tickets: Vec<Ticket>) -> DomainResult<()>;

    /// Delete a purchase and its tickets (checkout compensation)
    async fn remove(&self, purchase_id: &str) -> DomainResult<()>;

    async fn find_by_id(&self, purchase_id: &str) -> DomainResult<Option<Purchase>>;

    async fn find_tickets_for_purchase(&self, purchase_id: &str) -> DomainResult<Vec<Ticket>>;

    /// Tickets owned by a user, newest first
    async fn find_tickets_by_user(&self, user_id: &str) -> DomainResult<Vec<Ticket>>;
}
