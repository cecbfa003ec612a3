//! Ticket wallet: a user's tickets with the seats they admit to

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{DomainError, DomainResult, RepositoryProvider, Seat, Ticket};
use crate::shared::utils::{retry_with_backoff, RetryConfig};
use crate::shared::validations::validate_identifier;

#[derive(Debug, Clone)]
pub struct TicketWithSeat {
    pub ticket: Ticket,
    /// `None` only if the seat row has gone missing
    pub seat: Option<Seat>,
}

pub struct TicketService {
    repos: Arc<dyn RepositoryProvider>,
    retry: RetryConfig,
}

impl TicketService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, retry: RetryConfig) -> Self {
        Self { repos, retry }
    }

    /// Tickets owned by `user_id`, newest first
    pub async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<TicketWithSeat>> {
        validate_identifier("userId", user_id)?;

        let repos = self.repos.as_ref();
        let tickets = retry_with_backoff(
            self.retry.clone(),
            move || repos.purchases().find_tickets_by_user(user_id),
            DomainError::is_transient,
            "find_tickets_by_user",
        )
        .await?;
        if tickets.is_empty() {
            return Ok(Vec::new());
        }

        let seat_ids: Vec<String> = tickets.iter().map(|t| t.seat_id.clone()).collect();
        let seat_ids = seat_ids.as_slice();
        let mut seats: HashMap<String, Seat> = retry_with_backoff(
            self.retry.clone(),
            move || repos.seats().find_by_ids(seat_ids),
            DomainError::is_transient,
            "find_seats_by_ids",
        )
        .await?
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect();

        Ok(tickets
            .into_iter()
            .map(|ticket| {
                let seat = seats.remove(&ticket.seat_id);
                TicketWithSeat { ticket, seat }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::booking::services::{
        EventLocks, ReservationService, ReservationSettings,
    };
    use crate::domain::PaymentDetails;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::time::SystemClock;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn lists_purchased_tickets_with_seats() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let seats = vec![
            Seat::new("EV-1", "A", "1", 1, Decimal::from(100)),
            Seat::new("EV-1", "A", "1", 2, Decimal::from(100)),
        ];
        let ids: Vec<String> = seats.iter().map(|s| s.id.clone()).collect();
        repos.seats().insert_many(seats).await.unwrap();

        let reservations = ReservationService::new(
            repos.clone(),
            Arc::new(EventLocks::new()),
            SystemClock::shared(),
            ReservationSettings::default(),
        );
        let r = reservations.reserve("EV-1", "user-1", &ids).await.unwrap();
        reservations
            .finalize(&r.id, PaymentDetails::from_json(json!({})))
            .await
            .unwrap();

        let wallet = TicketService::new(repos, RetryConfig::none());
        let tickets = wallet.list_for_user("user-1").await.unwrap();
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| t.seat.as_ref().is_some_and(|s| s.is_sold_to(&r.id))));

        assert!(wallet.list_for_user("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_user_is_rejected() {
        let wallet = TicketService::new(Arc::new(InMemoryRepositoryProvider::new()), RetryConfig::none());
        assert!(matches!(
            wallet.list_for_user("").await,
            Err(DomainError::Validation(_))
        ));
    }
}
