//! In-memory repositories
//!
//! Seats live in one map per event; every conditional transition runs while
//! holding that event's map entry, so check-and-set over a seat set is a
//! single critical section.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::purchase::{Purchase, PurchaseRepository, Ticket};
use crate::domain::reservation::{Reservation, ReservationRepository, ReservationStatus};
use crate::domain::seat::{Seat, SeatRepository};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

// ── Seats ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemorySeatRepository {
    /// event_id -> (seat_id -> seat)
    by_event: DashMap<String, HashMap<String, Seat>>,
    /// seat_id -> event_id
    index: DashMap<String, String>,
}

impl InMemorySeatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group seat ids by owning event. Unknown ids are dropped.
    fn group_by_event(&self, seat_ids: &[String]) -> HashMap<String, Vec<String>> {
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for id in seat_ids {
            if let Some(event_id) = self.index.get(id) {
                groups
                    .entry(event_id.value().clone())
                    .or_default()
                    .push(id.clone());
            }
        }
        groups
    }

    /// Apply `op` to every seat in `seat_ids`, event by event, and count
    /// how many seats it changed.
    fn apply_each(&self, seat_ids: &[String], op: impl Fn(&mut Seat) -> bool) -> u64 {
        let mut changed = 0;
        for (event_id, ids) in self.group_by_event(seat_ids) {
            if let Some(mut seats) = self.by_event.get_mut(&event_id) {
                for id in ids {
                    if let Some(seat) = seats.get_mut(&id) {
                        if op(seat) {
                            changed += 1;
                        }
                    }
                }
            }
        }
        changed
    }
}

#[async_trait]
impl SeatRepository for InMemorySeatRepository {
    async fn find_by_event(&self, event_id: &str) -> DomainResult<Vec<Seat>> {
        let mut seats: Vec<Seat> = self
            .by_event
            .get(event_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        seats.sort_by(|a, b| a.cmp_position(b));
        Ok(seats)
    }

    async fn find_by_ids(&self, seat_ids: &[String]) -> DomainResult<Vec<Seat>> {
        let mut found = Vec::with_capacity(seat_ids.len());
        for id in seat_ids {
            let Some(event_id) = self.index.get(id).map(|e| e.value().clone()) else {
                continue;
            };
            if let Some(seat) = self
                .by_event
                .get(&event_id)
                .and_then(|m| m.get(id).cloned())
            {
                found.push(seat);
            }
        }
        Ok(found)
    }

    async fn count_by_event(&self, event_id: &str) -> DomainResult<u64> {
        Ok(self
            .by_event
            .get(event_id)
            .map(|m| m.len() as u64)
            .unwrap_or(0))
    }

    async fn insert_many(&self, seats: Vec<Seat>) -> DomainResult<()> {
        for seat in seats {
            self.index.insert(seat.id.clone(), seat.event_id.clone());
            self.by_event
                .entry(seat.event_id.clone())
                .or_default()
                .insert(seat.id.clone(), seat);
        }
        Ok(())
    }

    async fn claim(
        &self,
        event_id: &str,
        seat_ids: &[String],
        reservation_id: &str,
    ) -> DomainResult<()> {
        let Some(mut seats) = self.by_event.get_mut(event_id) else {
            return Err(DomainError::Validation(format!(
                "seats {} do not belong to event {}",
                seat_ids.join(", "),
                event_id
            )));
        };

        let mut unknown = Vec::new();
        let mut conflicts = Vec::new();
        for id in seat_ids {
            match seats.get(id) {
                None => unknown.push(id.clone()),
                Some(seat) if !seat.is_available() => conflicts.push(id.clone()),
                Some(_) => {}
            }
        }

        if !unknown.is_empty() {
            return Err(DomainError::Validation(format!(
                "seats {} do not belong to event {}",
                unknown.join(", "),
                event_id
            )));
        }
        if !conflicts.is_empty() {
            return Err(DomainError::SeatUnavailable { seat_ids: conflicts });
        }

        for id in seat_ids {
            if let Some(seat) = seats.get_mut(id) {
                seat.hold(reservation_id);
            }
        }
        Ok(())
    }

    async fn release(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<u64> {
        Ok(self.apply_each(seat_ids, |seat| seat.release(reservation_id)))
    }

    async fn sell(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<()> {
        let missing: Vec<String> = seat_ids
            .iter()
            .filter(|id| !self.index.contains_key(id.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::SeatUnavailable { seat_ids: missing });
        }

        for (event_id, ids) in self.group_by_event(seat_ids) {
            let Some(mut seats) = self.by_event.get_mut(&event_id) else {
                continue;
            };
            let not_held: Vec<String> = ids
                .iter()
                .filter(|id| {
                    !seats
                        .get(id.as_str())
                        .is_some_and(|s| s.is_held_by(reservation_id))
                })
                .cloned()
                .collect();
            if !not_held.is_empty() {
                return Err(DomainError::SeatUnavailable { seat_ids: not_held });
            }
            for id in &ids {
                if let Some(seat) = seats.get_mut(id) {
                    seat.sell(reservation_id);
                }
            }
        }
        Ok(())
    }

    async fn unsell(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<u64> {
        Ok(self.apply_each(seat_ids, |seat| seat.unsell(reservation_id)))
    }
}

// ── Reservations ────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryReservationRepository {
    reservations: DashMap<String, Reservation>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn save(&self, reservation: Reservation) -> DomainResult<()> {
        if self.reservations.contains_key(&reservation.id) {
            return Err(DomainError::Validation(format!(
                "reservation {} already exists",
                reservation.id
            )));
        }
        self.reservations.insert(reservation.id.clone(), reservation);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(id).map(|r| r.clone()))
    }

    async fn transition(
        &self,
        id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<bool> {
        let mut reservation = self
            .reservations
            .get_mut(id)
            .ok_or_else(|| DomainError::ReservationNotFound(id.to_string()))?;
        if reservation.status != from {
            return Ok(false);
        }
        reservation.status = to;
        Ok(true)
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| r.is_overdue(now))
            .map(|r| r.clone())
            .collect())
    }
}

// ── Purchases ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryPurchaseRepository {
    purchases: DashMap<String, Purchase>,
    /// purchase_id -> tickets
    tickets: DashMap<String, Vec<Ticket>>,
}

impl InMemoryPurchaseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn record(&self, purchase: Purchase, tickets: Vec<Ticket>) -> DomainResult<()> {
        if self.purchases.contains_key(&purchase.id) {
            return Err(DomainError::Validation(format!(
                "purchase {} already exists",
                purchase.id
            )));
        }
        self.tickets.insert(purchase.id.clone(), tickets);
        self.purchases.insert(purchase.id.clone(), purchase);
        Ok(())
    }

    async fn remove(&self, purchase_id: &str) -> DomainResult<()> {
        self.purchases.remove(purchase_id);
        self.tickets.remove(purchase_id);
        Ok(())
    }

    async fn find_by_id(&self, purchase_id: &str) -> DomainResult<Option<Purchase>> {
        Ok(self.purchases.get(purchase_id).map(|p| p.clone()))
    }

    async fn find_tickets_for_purchase(&self, purchase_id: &str) -> DomainResult<Vec<Ticket>> {
        Ok(self
            .tickets
            .get(purchase_id)
            .map(|t| t.clone())
            .unwrap_or_default())
    }

    async fn find_tickets_by_user(&self, user_id: &str) -> DomainResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|t| t.user_id == user_id)
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }
}

// ── Provider ────────────────────────────────────────────────────

/// In-memory storage for development and testing
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    seats: InMemorySeatRepository,
    reservations: InMemoryReservationRepository,
    purchases: InMemoryPurchaseRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
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

// ── Tests ──────────────────────────────────────────────────────
