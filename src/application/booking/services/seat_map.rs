//! Seat map listing with lazy generation
//!
//! The first time an event with no seats is listed, a seat map is generated
//! from the configured layout.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::event_locks::EventLocks;
use crate::domain::{DomainError, DomainResult, RepositoryProvider, Seat};
use crate::shared::utils::{retry_with_backoff, RetryConfig};
use crate::shared::validations::validate_identifier;

/// One priced section of a generated seat map
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLayout {
    pub name: String,
    pub price: Decimal,
}

/// Shape of a generated seat map: every section gets `rows` rows of
/// `seats_per_row` seats, rows labelled "1", "2", ...
#[derive(Debug, Clone, PartialEq)]
pub struct SeatMapLayout {
    pub sections: Vec<SectionLayout>,
    pub rows: u32,
    pub seats_per_row: u32,
}

impl Default for SeatMapLayout {
    fn default() -> Self {
        Self {
            sections: vec![
                SectionLayout {
                    name: "A".to_string(),
                    price: Decimal::from(50_000),
                },
                SectionLayout {
                    name: "B".to_string(),
                    price: Decimal::from(30_000),
                },
            ],
            rows: 5,
            seats_per_row: 10,
        }
    }
}

impl SeatMapLayout {
    pub fn seat_count(&self) -> usize {
        self.sections.len() * self.rows as usize * self.seats_per_row as usize
    }

    pub fn generate(&self, event_id: &str) -> Vec<Seat> {
        let mut seats = Vec::with_capacity(self.seat_count());
        for section in &self.sections {
            for row in 1..=self.rows {
                for number in 1..=self.seats_per_row {
                    seats.push(Seat::new(
                        event_id,
                        section.name.clone(),
                        row.to_string(),
                        number,
                        section.price,
                    ));
                }
            }
        }
        seats
    }
}

pub struct SeatMapService {
    repos: Arc<dyn RepositoryProvider>,
    locks: Arc<EventLocks>,
    layout: SeatMapLayout,
    retry: RetryConfig,
}

impl SeatMapService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        locks: Arc<EventLocks>,
        layout: SeatMapLayout,
        retry: RetryConfig,
    ) -> Self {
        Self {
            repos,
            locks,
            layout,
            retry,
        }
    }

    /// All seats of `event_id` in section/row/number order.
    pub async fn list(&self, event_id: &str) -> DomainResult<Vec<Seat>> {
        validate_identifier("eventId", event_id)?;

        let seats = self.find(event_id).await?;
        if !seats.is_empty() || self.layout.seat_count() == 0 {
            return Ok(seats);
        }

        let _guard = self.locks.lock(event_id).await;
        if self.repos.seats().count_by_event(event_id).await? == 0 {
            let generated = self.layout.generate(event_id);
            let count = generated.len();
            self.repos.seats().insert_many(generated).await?;
            info!(event_id, seats = count, "Seat map generated");
        }
        self.find(event_id).await
    }

    async fn find(&self, event_id: &str) -> DomainResult<Vec<Seat>> {
        let repos = self.repos.as_ref();
        retry_with_backoff(
            self.retry.clone(),
            move || repos.seats().find_by_event(event_id),
            DomainError::is_transient,
            "find_seats_by_event",
        )
        .await
    }
}
