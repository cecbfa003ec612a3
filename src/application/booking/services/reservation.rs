//! Reservation manager
//!
//! Owns the life of a seat hold: reserve, read (with lazy expiry), cancel,
//! finalize into a purchase, and sweep overdue holds. Every multi-step
//! change runs under the event's lock; the repositories' conditional seat
//! updates keep a seat from ever having two holders.

use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::event_locks::EventLocks;
use crate::domain::purchase::{total_with_service_fee, PaymentStatus};
use crate::domain::{
    DomainError, DomainResult, PaymentDetails, Purchase, RepositoryProvider, Reservation,
    ReservationStatus, Seat, Ticket,
};
use crate::shared::time::SharedClock;
use crate::shared::utils::{retry_with_backoff, RetryConfig};
use crate::shared::validations::{validate_identifier, validate_seat_ids};

/// Default hold window
pub const DEFAULT_HOLD_MINUTES: i64 = 10;
/// Default service fee applied on checkout
pub const DEFAULT_SERVICE_FEE_PERCENT: u32 = 10;

/// Tunables for [`ReservationService`]
#[derive(Debug, Clone)]
pub struct ReservationSettings {
    pub hold: Duration,
    pub service_fee_percent: u32,
    /// Applied to idempotent reads only
    pub retry: RetryConfig,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            hold: Duration::minutes(DEFAULT_HOLD_MINUTES),
            service_fee_percent: DEFAULT_SERVICE_FEE_PERCENT,
            retry: RetryConfig::default(),
        }
    }
}

/// A reservation together with the seats it references
#[derive(Debug, Clone)]
pub struct ReservationDetails {
    pub reservation: Reservation,
    pub seats: Vec<Seat>,
}

/// A completed purchase together with the tickets it issued
#[derive(Debug, Clone)]
pub struct Checkout {
    pub purchase: Purchase,
    pub tickets: Vec<Ticket>,
}

pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    locks: Arc<EventLocks>,
    clock: SharedClock,
    settings: ReservationSettings,
}

impl ReservationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        locks: Arc<EventLocks>,
        clock: SharedClock,
        settings: ReservationSettings,
    ) -> Self {
        Self {
            repos,
            locks,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &ReservationSettings {
        &self.settings
    }

    // ── Operations ──────────────────────────────────────────────

    /// Hold `seat_ids` for `user_id`. All seats are claimed or none are.
    pub async fn reserve(
        &self,
        event_id: &str,
        user_id: &str,
        seat_ids: &[String],
    ) -> DomainResult<Reservation> {
        validate_identifier("eventId", event_id)?;
        validate_identifier("userId", user_id)?;
        validate_seat_ids(seat_ids)?;

        let _guard = self.locks.lock(event_id).await;

        let reservation = Reservation::new(
            user_id,
            event_id,
            seat_ids.to_vec(),
            self.clock.now(),
            self.settings.hold,
        );

        if let Err(e) = self.claim(&reservation).await {
            if let DomainError::SeatUnavailable { seat_ids: conflicts } = &e {
                metrics::counter!("seat_conflicts_total").increment(1);
                info!(
                    event_id,
                    user_id,
                    conflicts = conflicts.len(),
                    "Seat hold rejected"
                );
            }
            return Err(e);
        }

        if let Err(e) = self.repos.reservations().save(reservation.clone()).await {
            error!(reservation_id = %reservation.id, error = %e, "Saving reservation failed, releasing seats");
            if let Err(release_err) = self
                .repos
                .seats()
                .release(&reservation.seat_ids, &reservation.id)
                .await
            {
                error!(reservation_id = %reservation.id, error = %release_err, "Releasing seats failed");
            }
            return Err(e);
        }

        metrics::counter!("reservations_created_total").increment(1);
        info!(
            reservation_id = %reservation.id,
            event_id,
            user_id,
            seats = reservation.seat_ids.len(),
            expires_at = %reservation.expires_at,
            "Seats reserved"
        );

        Ok(reservation)
    }

    /// Load a reservation, expiring it first if its hold has lapsed.
    pub async fn get(&self, reservation_id: &str) -> DomainResult<Reservation> {
        let reservation = self.load(reservation_id).await?;
        if !reservation.is_overdue(self.clock.now()) {
            return Ok(reservation);
        }

        let _guard = self.locks.lock(&reservation.event_id).await;
        let reservation = self.load(reservation_id).await?;
        if reservation.is_overdue(self.clock.now()) {
            self.expire_locked(&reservation).await?;
            return self.load(reservation_id).await;
        }
        Ok(reservation)
    }

    /// [`get`](Self::get) plus the referenced seats, in hold order.
    pub async fn get_detailed(&self, reservation_id: &str) -> DomainResult<ReservationDetails> {
        let reservation = self.get(reservation_id).await?;
        let seats = self.load_seats(&reservation.seat_ids).await?;
        Ok(ReservationDetails { reservation, seats })
    }

    /// Release an active hold. Cancelling an expired or completed
    /// reservation changes nothing.
    pub async fn cancel(&self, reservation_id: &str) -> DomainResult<Reservation> {
        let reservation = self.load(reservation_id).await?;
        let _guard = self.locks.lock(&reservation.event_id).await;

        let reservation = self.load(reservation_id).await?;
        if reservation.status.is_terminal() {
            debug!(reservation_id, status = %reservation.status, "Cancel on terminal reservation ignored");
            return Ok(reservation);
        }

        self.expire_locked(&reservation).await?;
        info!(reservation_id, event_id = %reservation.event_id, "Reservation cancelled");
        self.load(reservation_id).await
    }

    /// Turn an active hold into a purchase with one ticket per seat.
    ///
    /// Any failure after the seats were sold is undone: the purchase is
    /// removed, the seats become available and the reservation expires.
    /// The returned [`Checkout`] carries the tickets that were written, so
    /// callers never need a second read to answer the buyer.
    pub async fn finalize(
        &self,
        reservation_id: &str,
        payment: PaymentDetails,
    ) -> DomainResult<Checkout> {
        validate_identifier("reservationId", reservation_id)?;

        let reservation = self.load(reservation_id).await?;
        let _guard = self.locks.lock(&reservation.event_id).await;
        let reservation = self.load(reservation_id).await?;

        let now = self.clock.now();
        if reservation.is_overdue(now) {
            self.expire_locked(&reservation).await?;
            return Err(DomainError::ReservationExpired(reservation.id));
        }
        if !reservation.is_active() {
            return Err(DomainError::reservation_not_active(
                &reservation.id,
                reservation.status,
            ));
        }

        let seats = self.load_seats(&reservation.seat_ids).await?;
        let subtotal: Decimal = seats.iter().map(|s| s.price).sum();
        let total = total_with_service_fee(subtotal, self.settings.service_fee_percent);

        self.repos
            .seats()
            .sell(&reservation.seat_ids, &reservation.id)
            .await?;

        let purchase = Purchase {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: reservation.user_id.clone(),
            event_id: reservation.event_id.clone(),
            reservation_id: reservation.id.clone(),
            total,
            payment_method: payment.method,
            payment_status: PaymentStatus::Completed,
            transaction_id: uuid::Uuid::new_v4().to_string(),
            payment_details: payment.raw,
            created_at: now,
        };
        let tickets: Vec<Ticket> = reservation
            .seat_ids
            .iter()
            .map(|seat_id| Ticket::issue(&purchase, seat_id.clone()))
            .collect();

        if let Err(e) = self
            .repos
            .purchases()
            .record(purchase.clone(), tickets.clone())
            .await
        {
            error!(reservation_id, error = %e, "Recording purchase failed");
            self.undo_checkout(&reservation, None).await;
            return Err(e);
        }

        match self
            .repos
            .reservations()
            .transition(
                &reservation.id,
                ReservationStatus::Active,
                ReservationStatus::Completed,
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                self.undo_checkout(&reservation, Some(&purchase.id)).await;
                let current = self.load(reservation_id).await?;
                return Err(DomainError::reservation_not_active(
                    &current.id,
                    current.status,
                ));
            }
            Err(e) => {
                error!(reservation_id, error = %e, "Completing reservation failed");
                self.undo_checkout(&reservation, Some(&purchase.id)).await;
                return Err(e);
            }
        }

        metrics::counter!("purchases_completed_total").increment(1);
        info!(
            purchase_id = %purchase.id,
            reservation_id,
            event_id = %purchase.event_id,
            total = %purchase.total,
            tickets = reservation.seat_ids.len(),
            "Checkout completed"
        );

        Ok(Checkout { purchase, tickets })
    }

    /// Expire every active hold whose window has lapsed. Returns how many
    /// reservations this call expired.
    pub async fn expire_overdue(&self) -> DomainResult<usize> {
        let overdue = self
            .repos
            .reservations()
            .find_overdue(self.clock.now())
            .await?;

        let mut expired = 0;
        for candidate in overdue {
            let _guard = self.locks.lock(&candidate.event_id).await;
            let Some(current) = self.repos.reservations().find_by_id(&candidate.id).await? else {
                continue;
            };
            if current.is_overdue(self.clock.now()) && self.expire_locked(&current).await? {
                expired += 1;
            }
        }
        self.locks.prune();
        Ok(expired)
    }

    // ── Internals ───────────────────────────────────────────────

    async fn load(&self, reservation_id: &str) -> DomainResult<Reservation> {
        let repos = self.repos.as_ref();
        retry_with_backoff(
            self.settings.retry.clone(),
            move || repos.reservations().find_by_id(reservation_id),
            DomainError::is_transient,
            "find_reservation",
        )
        .await?
        .ok_or_else(|| DomainError::ReservationNotFound(reservation_id.to_string()))
    }

    async fn load_seats(&self, seat_ids: &[String]) -> DomainResult<Vec<Seat>> {
        let repos = self.repos.as_ref();
        retry_with_backoff(
            self.settings.retry.clone(),
            move || repos.seats().find_by_ids(seat_ids),
            DomainError::is_transient,
            "find_seats_by_ids",
        )
        .await
    }

    /// Claim the reservation's seats. Seats still held by lapsed
    /// reservations are reclaimed once before giving up.
    async fn claim(&self, reservation: &Reservation) -> DomainResult<()> {
        let seats = self.repos.seats();
        match seats
            .claim(&reservation.event_id, &reservation.seat_ids, &reservation.id)
            .await
        {
            Err(DomainError::SeatUnavailable { seat_ids }) => {
                if self.expire_lapsed_holders(&seat_ids).await? == 0 {
                    return Err(DomainError::SeatUnavailable { seat_ids });
                }
                seats
                    .claim(&reservation.event_id, &reservation.seat_ids, &reservation.id)
                    .await
            }
            other => other,
        }
    }

    /// Expire overdue reservations holding any of `seat_ids`. Caller holds
    /// the event lock.
    async fn expire_lapsed_holders(&self, seat_ids: &[String]) -> DomainResult<usize> {
        let mut holders: Vec<String> = self
            .repos
            .seats()
            .find_by_ids(seat_ids)
            .await?
            .into_iter()
            .filter_map(|s| s.reservation_id)
            .collect();
        holders.sort();
        holders.dedup();

        let now = self.clock.now();
        let mut expired = 0;
        for id in holders {
            if let Some(holder) = self.repos.reservations().find_by_id(&id).await? {
                if holder.is_overdue(now) && self.expire_locked(&holder).await? {
                    expired += 1;
                }
            }
        }
        Ok(expired)
    }

    /// Release the reservation's seats and move it to expired. Caller holds
    /// the event lock. Returns whether this call made the transition.
    async fn expire_locked(&self, reservation: &Reservation) -> DomainResult<bool> {
        let released = self
            .repos
            .seats()
            .release(&reservation.seat_ids, &reservation.id)
            .await?;
        let expired = self
            .repos
            .reservations()
            .transition(
                &reservation.id,
                ReservationStatus::Active,
                ReservationStatus::Expired,
            )
            .await?;

        if expired {
            metrics::counter!("reservations_expired_total").increment(1);
            info!(
                reservation_id = %reservation.id,
                event_id = %reservation.event_id,
                released,
                "Reservation expired"
            );
        }
        Ok(expired)
    }

    /// Best-effort rollback of a checkout whose seats were already sold.
    async fn undo_checkout(&self, reservation: &Reservation, purchase_id: Option<&str>) {
        if let Some(purchase_id) = purchase_id {
            if let Err(e) = self.repos.purchases().remove(purchase_id).await {
                error!(purchase_id, error = %e, "Removing purchase during rollback failed");
            }
        }

        let seats = self.repos.seats();
        match seats.unsell(&reservation.seat_ids, &reservation.id).await {
            Ok(n) => debug!(reservation_id = %reservation.id, seats = n, "Sold seats reverted"),
            Err(e) => error!(reservation_id = %reservation.id, error = %e, "Reverting sold seats failed"),
        }
        if let Err(e) = seats.release(&reservation.seat_ids, &reservation.id).await {
            error!(reservation_id = %reservation.id, error = %e, "Releasing held seats failed");
        }

        match self
            .repos
            .reservations()
            .transition(
                &reservation.id,
                ReservationStatus::Active,
                ReservationStatus::Expired,
            )
            .await
        {
            Ok(_) => warn!(reservation_id = %reservation.id, "Checkout rolled back"),
            Err(e) => error!(reservation_id = %reservation.id, error = %e, "Expiring reservation during rollback failed"),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::purchase::PurchaseRepository;
    use crate::domain::reservation::ReservationRepository;
    use crate::domain::seat::SeatRepository;
    use crate::domain::SeatStatus;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::time::ManualClock;
    use async_trait::async_trait;
    use serde_json::json;

    struct Harness {
        service: Arc<ReservationService>,
        repos: Arc<dyn RepositoryProvider>,
        clock: Arc<ManualClock>,
        locks: Arc<EventLocks>,
    }

    fn settings() -> ReservationSettings {
        ReservationSettings {
            retry: RetryConfig::none(),
            ..ReservationSettings::default()
        }
    }

    fn harness_with(repos: Arc<dyn RepositoryProvider>) -> Harness {
        let clock = ManualClock::starting_now();
        let locks = Arc::new(EventLocks::new());
        let service = Arc::new(ReservationService::new(
            repos.clone(),
            locks.clone(),
            clock.clone(),
            settings(),
        ));
        Harness {
            service,
            repos,
            clock,
            locks,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(InMemoryRepositoryProvider::new()))
    }

    async fn seed(repos: &dyn RepositoryProvider, event_id: &str, prices: &[i64]) -> Vec<String> {
        let seats: Vec<Seat> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| Seat::new(event_id, "A", "1", i as u32 + 1, Decimal::from(*p)))
            .collect();
        let ids = seats.iter().map(|s| s.id.clone()).collect();
        repos.seats().insert_many(seats).await.unwrap();
        ids
    }

    async fn statuses(repos: &dyn RepositoryProvider, ids: &[String]) -> Vec<SeatStatus> {
        repos
            .seats()
            .find_by_ids(ids)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.status)
            .collect()
    }

    fn card() -> PaymentDetails {
        PaymentDetails::from_json(json!({"cardLast4": "4242"}))
    }

    #[tokio::test]
    async fn reserve_then_get_round_trips() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100, 200]).await;

        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();
        assert_eq!(r.status, ReservationStatus::Active);
        assert_eq!(r.expires_at, r.created_at + Duration::minutes(10));

        let loaded = h.service.get(&r.id).await.unwrap();
        assert_eq!(loaded, r);

        let details = h.service.get_detailed(&r.id).await.unwrap();
        assert_eq!(details.seats.len(), 2);
        assert!(details.seats.iter().all(|s| s.is_held_by(&r.id)));
    }

    #[tokio::test]
    async fn reserve_validates_input() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100]).await;

        assert!(matches!(
            h.service.reserve("EV-1", "user-1", &[]).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            h.service.reserve("EV-1", " ", &ids).await,
            Err(DomainError::Validation(_))
        ));
        let dup = vec![ids[0].clone(), ids[0].clone()];
        assert!(matches!(
            h.service.reserve("EV-1", "user-1", &dup).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            h.service.reserve("EV-2", "user-1", &ids).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn overlapping_holds_conflict() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100, 100, 100]).await;

        h.service.reserve("EV-1", "a", &ids[..2]).await.unwrap();
        let err = h.service.reserve("EV-1", "b", &ids[1..]).await.unwrap_err();
        assert!(matches!(err, DomainError::SeatUnavailable { .. }));

        // b's free seat was not left held
        assert_eq!(
            statuses(h.repos.as_ref(), &ids[2..]).await,
            vec![SeatStatus::Available]
        );
    }

    #[tokio::test]
    async fn concurrent_overlapping_holds_admit_one() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100, 100, 100, 100]).await;

        let mut tasks = Vec::new();
        for user in 0..8 {
            let service = h.service.clone();
            // every request wants seat 0 plus one other
            let wanted = vec![ids[0].clone(), ids[1 + user % 3].clone()];
            tasks.push(tokio::spawn(async move {
                service.reserve("EV-1", &format!("user-{user}"), &wanted).await
            }));
        }

        let mut won = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => won += 1,
                Err(DomainError::SeatUnavailable { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(won, 1);

        let held = statuses(h.repos.as_ref(), &ids)
            .await
            .into_iter()
            .filter(|s| *s == SeatStatus::Reserved)
            .count();
        assert_eq!(held, 2);
    }

    #[tokio::test]
    async fn cancel_releases_and_is_idempotent() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100, 100]).await;
        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();

        let cancelled = h.service.cancel(&r.id).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Expired);
        assert_eq!(
            statuses(h.repos.as_ref(), &ids).await,
            vec![SeatStatus::Available, SeatStatus::Available]
        );

        let again = h.service.cancel(&r.id).await.unwrap();
        assert_eq!(again.status, ReservationStatus::Expired);

        // Seats are free for someone else
        h.service.reserve("EV-1", "user-2", &ids).await.unwrap();
    }

    #[tokio::test]
    async fn cancel_unknown_reservation_is_not_found() {
        let h = harness();
        assert!(matches!(
            h.service.cancel("nope").await,
            Err(DomainError::ReservationNotFound(_))
        ));
        assert!(matches!(
            h.service.get("nope").await,
            Err(DomainError::ReservationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn cancel_after_checkout_keeps_seats_sold() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100]).await;
        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();
        h.service.finalize(&r.id, card()).await.unwrap();

        let after = h.service.cancel(&r.id).await.unwrap();
        assert_eq!(after.status, ReservationStatus::Completed);
        assert_eq!(statuses(h.repos.as_ref(), &ids).await, vec![SeatStatus::Sold]);
    }

    #[tokio::test]
    async fn lapsed_hold_expires_on_read() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100]).await;
        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();

        h.clock.advance(Duration::minutes(10));
        assert_eq!(
            h.service.get(&r.id).await.unwrap().status,
            ReservationStatus::Active
        );

        h.clock.advance(Duration::seconds(1));
        assert_eq!(
            h.service.get(&r.id).await.unwrap().status,
            ReservationStatus::Expired
        );
        assert_eq!(
            statuses(h.repos.as_ref(), &ids).await,
            vec![SeatStatus::Available]
        );
    }

    #[tokio::test]
    async fn lapsed_hold_does_not_block_new_reservation() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100]).await;
        let first = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();

        h.clock.advance(Duration::minutes(11));
        let second = h.service.reserve("EV-1", "user-2", &ids).await.unwrap();

        let first = h.repos.reservations().find_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(first.status, ReservationStatus::Expired);
        let seat = &h.repos.seats().find_by_ids(&ids).await.unwrap()[0];
        assert!(seat.is_held_by(&second.id));
    }

    #[tokio::test]
    async fn finalize_charges_service_fee_and_issues_tickets() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[80_000, 150_000]).await;
        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();

        let Checkout { purchase, tickets } = h.service.finalize(&r.id, card()).await.unwrap();
        assert_eq!(purchase.total, Decimal::from(253_000));
        assert_eq!(purchase.payment_method, "credit_card");
        assert_eq!(purchase.reservation_id, r.id);
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| t.purchase_id == purchase.id));

        let stored = h
            .repos
            .purchases()
            .find_tickets_for_purchase(&purchase.id)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(
            statuses(h.repos.as_ref(), &ids).await,
            vec![SeatStatus::Sold, SeatStatus::Sold]
        );
        assert_eq!(
            h.service.get(&r.id).await.unwrap().status,
            ReservationStatus::Completed
        );
    }

    #[tokio::test]
    async fn finalize_twice_is_rejected() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100]).await;
        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();
        h.service.finalize(&r.id, card()).await.unwrap();

        match h.service.finalize(&r.id, card()).await {
            Err(DomainError::ReservationNotActive { status, .. }) => assert_eq!(status, "completed"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn finalize_after_expiry_cleans_up() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100]).await;
        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();

        h.clock.advance(Duration::minutes(11));
        assert!(matches!(
            h.service.finalize(&r.id, card()).await,
            Err(DomainError::ReservationExpired(_))
        ));
        assert_eq!(
            statuses(h.repos.as_ref(), &ids).await,
            vec![SeatStatus::Available]
        );

        // Second attempt sees the terminal status
        assert!(matches!(
            h.service.finalize(&r.id, card()).await,
            Err(DomainError::ReservationNotActive { .. })
        ));
    }

    #[tokio::test]
    async fn finalize_unknown_reservation_is_not_found() {
        let h = harness();
        assert!(matches!(
            h.service.finalize("nope", card()).await,
            Err(DomainError::ReservationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn expire_overdue_sweeps_lapsed_holds_only() {
        let h = harness();
        let ids = seed(h.repos.as_ref(), "EV-1", &[100, 100]).await;
        let old = h.service.reserve("EV-1", "user-1", &ids[..1]).await.unwrap();
        h.clock.advance(Duration::minutes(8));
        let fresh = h.service.reserve("EV-1", "user-2", &ids[1..]).await.unwrap();

        h.clock.advance(Duration::minutes(3));
        assert_eq!(h.service.expire_overdue().await.unwrap(), 1);
        assert_eq!(h.service.expire_overdue().await.unwrap(), 0);

        let reservations = h.repos.reservations();
        assert_eq!(
            reservations.find_by_id(&old.id).await.unwrap().unwrap().status,
            ReservationStatus::Expired
        );
        assert_eq!(
            reservations.find_by_id(&fresh.id).await.unwrap().unwrap().status,
            ReservationStatus::Active
        );
    }

    #[tokio::test]
    async fn sweep_forgets_idle_event_locks() {
        let h = harness();
        for n in 0..20 {
            let event = format!("EV-{n}");
            let ids = seed(h.repos.as_ref(), &event, &[100]).await;
            h.service.reserve(&event, "user-1", &ids).await.unwrap();
        }
        // Unknown events still take their lock before failing
        for n in 0..20 {
            let _ = h.service.reserve(&format!("ghost-{n}"), "user-1", &["S".to_string()]).await;
        }
        assert!(h.locks.len() >= 20);

        h.service.expire_overdue().await.unwrap();
        assert!(h.locks.is_empty());
    }

    // ── Rollback ────────────────────────────────────────────────

    /// Purchases that can never be written
    struct BrokenPurchases;

    #[async_trait]
    impl PurchaseRepository for BrokenPurchases {
        async fn record(&self, _: Purchase, _: Vec<Ticket>) -> DomainResult<()> {
            Err(DomainError::StorageUnavailable("disk full".into()))
        }
        async fn remove(&self, _: &str) -> DomainResult<()> {
            Ok(())
        }
        async fn find_by_id(&self, _: &str) -> DomainResult<Option<Purchase>> {
            Ok(None)
        }
        async fn find_tickets_for_purchase(&self, _: &str) -> DomainResult<Vec<Ticket>> {
            Ok(Vec::new())
        }
        async fn find_tickets_by_user(&self, _: &str) -> DomainResult<Vec<Ticket>> {
            Ok(Vec::new())
        }
    }

    struct BrokenCheckoutProvider {
        inner: InMemoryRepositoryProvider,
        purchases: BrokenPurchases,
    }

    impl RepositoryProvider for BrokenCheckoutProvider {
        fn seats(&self) -> &dyn SeatRepository {
            self.inner.seats()
        }
        fn reservations(&self) -> &dyn ReservationRepository {
            self.inner.reservations()
        }
        fn purchases(&self) -> &dyn PurchaseRepository {
            &self.purchases
        }
    }

    #[tokio::test]
    async fn failed_purchase_write_rolls_back_checkout() {
        let h = harness_with(Arc::new(BrokenCheckoutProvider {
            inner: InMemoryRepositoryProvider::new(),
            purchases: BrokenPurchases,
        }));
        let ids = seed(h.repos.as_ref(), "EV-1", &[100, 200]).await;
        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();

        let err = h.service.finalize(&r.id, card()).await.unwrap_err();
        assert!(matches!(err, DomainError::StorageUnavailable(_)));

        assert_eq!(
            statuses(h.repos.as_ref(), &ids).await,
            vec![SeatStatus::Available, SeatStatus::Available]
        );
        let seats = h.repos.seats().find_by_ids(&ids).await.unwrap();
        assert!(seats.iter().all(|s| s.reservation_id.is_none()));
        assert_eq!(
            h.service.get(&r.id).await.unwrap().status,
            ReservationStatus::Expired
        );
    }

    /// Writes go to memory, every ticket read fails
    struct UnreadableTickets(InMemoryRepositoryProvider);

    #[async_trait]
    impl PurchaseRepository for UnreadableTickets {
        async fn record(&self, purchase: Purchase, tickets: Vec<Ticket>) -> DomainResult<()> {
            self.0.purchases().record(purchase, tickets).await
        }
        async fn remove(&self, purchase_id: &str) -> DomainResult<()> {
            self.0.purchases().remove(purchase_id).await
        }
        async fn find_by_id(&self, purchase_id: &str) -> DomainResult<Option<Purchase>> {
            self.0.purchases().find_by_id(purchase_id).await
        }
        async fn find_tickets_for_purchase(&self, _: &str) -> DomainResult<Vec<Ticket>> {
            Err(DomainError::StorageUnavailable("replica lagging".into()))
        }
        async fn find_tickets_by_user(&self, _: &str) -> DomainResult<Vec<Ticket>> {
            Err(DomainError::StorageUnavailable("replica lagging".into()))
        }
    }

    impl RepositoryProvider for UnreadableTickets {
        fn seats(&self) -> &dyn SeatRepository {
            self.0.seats()
        }
        fn reservations(&self) -> &dyn ReservationRepository {
            self.0.reservations()
        }
        fn purchases(&self) -> &dyn PurchaseRepository {
            self
        }
    }

    #[tokio::test]
    async fn finalize_returns_tickets_without_reading_them_back() {
        let h = harness_with(Arc::new(UnreadableTickets(InMemoryRepositoryProvider::new())));
        let ids = seed(h.repos.as_ref(), "EV-1", &[100, 200]).await;
        let r = h.service.reserve("EV-1", "user-1", &ids).await.unwrap();

        let checkout = h.service.finalize(&r.id, card()).await.unwrap();
        assert_eq!(checkout.tickets.len(), 2);
        let mut seats: Vec<_> = checkout.tickets.iter().map(|t| t.seat_id.clone()).collect();
        seats.sort();
        let mut expected = ids.clone();
        expected.sort();
        assert_eq!(seats, expected);
        assert_eq!(
            statuses(h.repos.as_ref(), &ids).await,
            vec![SeatStatus::Sold, SeatStatus::Sold]
        );
    }
}
