//! Waiting-room admission queue
//!
//! Caps how many shoppers per event hold a live session at once; everyone
//! else waits in FIFO order and is promoted as sessions lapse. Each event's
//! room lives in one map entry, so every mutation for that event happens
//! under its entry lock.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use crate::domain::waiting_room::{ActiveSession, QueueEntry, RoomSnapshot};
use crate::domain::{AdmissionStatus, DomainResult};
use crate::shared::time::SharedClock;
use crate::shared::validations::validate_identifier;

/// Tunables for [`AdmissionQueue`]
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Live sessions allowed per event
    pub max_active_per_event: usize,
    pub session_duration: Duration,
    /// Estimated wait added per queue position
    pub wait_per_position: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_active_per_event: 5,
            session_duration: Duration::minutes(10),
            wait_per_position: Duration::minutes(2),
        }
    }
}

#[derive(Debug, Default)]
struct EventRoom {
    queue: VecDeque<QueueEntry>,
    sessions: HashMap<String, ActiveSession>,
}

impl EventRoom {
    /// Drop sessions that are no longer live; returns how many went.
    fn purge(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.is_live(now));
        before - self.sessions.len()
    }

    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.sessions.is_empty()
    }

    /// 1-based position of `user_id` in the queue
    fn position_of(&self, user_id: &str) -> Option<usize> {
        self.queue
            .iter()
            .position(|e| e.user_id == user_id)
            .map(|i| i + 1)
    }

    /// Admit queue heads into free slots, oldest first.
    fn promote(&mut self, now: DateTime<Utc>, config: &AdmissionConfig) -> usize {
        let mut promoted = 0;
        while self.sessions.len() < config.max_active_per_event {
            let Some(entry) = self.queue.pop_front() else {
                break;
            };
            let session = ActiveSession {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: entry.user_id.clone(),
                event_id: entry.event_id,
                expires_at: now + config.session_duration,
            };
            debug!(user_id = %entry.user_id, session_id = %session.id, "Promoted from waiting room");
            self.sessions.insert(entry.user_id, session);
            promoted += 1;
        }
        promoted
    }
}

pub struct AdmissionQueue {
    rooms: DashMap<String, EventRoom>,
    config: AdmissionConfig,
    clock: SharedClock,
}

impl AdmissionQueue {
    pub fn new(config: AdmissionConfig, clock: SharedClock) -> Self {
        Self {
            rooms: DashMap::new(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Enter the waiting room for `event_id`.
    ///
    /// A user with a live session stays active; a user already queued keeps
    /// their place. Otherwise the user joins the back of the queue, and free
    /// slots are filled from the front right away.
    pub fn join(&self, event_id: &str, user_id: &str) -> DomainResult<AdmissionStatus> {
        validate_identifier("eventId", event_id)?;
        validate_identifier("userId", user_id)?;

        let now = self.clock.now();
        let mut room = self.rooms.entry(event_id.to_string()).or_default();
        room.purge(now);

        if let Some(session) = room.sessions.get(user_id) {
            return Ok(AdmissionStatus::active(session));
        }
        if let Some(position) = room.position_of(user_id) {
            return Ok(AdmissionStatus::waiting(position, None));
        }

        room.queue.push_back(QueueEntry {
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            enqueued_at: now,
        });
        info!(event_id, user_id, queued = room.queue.len(), "Joined waiting room");

        let promoted = room.promote(now, &self.config);
        self.record(event_id, &room, promoted);

        Ok(match room.sessions.get(user_id) {
            Some(session) => AdmissionStatus::active(session),
            None => AdmissionStatus::waiting(room.position_of(user_id).unwrap_or(room.queue.len()), None),
        })
    }

    /// Poll where `user_id` stands, promoting waiting users into any slots
    /// freed since the last call.
    pub fn status(&self, event_id: &str, user_id: &str) -> DomainResult<AdmissionStatus> {
        validate_identifier("eventId", event_id)?;
        validate_identifier("userId", user_id)?;

        let now = self.clock.now();
        let Some(mut room) = self.rooms.get_mut(event_id) else {
            return Ok(AdmissionStatus::not_in_queue());
        };
        let purged = room.purge(now);

        if let Some(session) = room.sessions.get(user_id) {
            return Ok(AdmissionStatus::active(session));
        }
        if room.position_of(user_id).is_none() {
            if purged > 0 {
                self.record(event_id, &room, 0);
            }
            if room.is_idle() {
                drop(room);
                self.rooms.remove_if(event_id, |_, r| r.is_idle());
            }
            return Ok(AdmissionStatus::not_in_queue());
        }

        let promoted = room.promote(now, &self.config);
        self.record(event_id, &room, promoted);

        if let Some(session) = room.sessions.get(user_id) {
            return Ok(AdmissionStatus::active(session));
        }
        match room.position_of(user_id) {
            Some(position) => Ok(AdmissionStatus::waiting(
                position,
                Some(self.estimated_wait_minutes(position)),
            )),
            None => Ok(AdmissionStatus::not_in_queue()),
        }
    }

    /// Drop rooms whose sessions have all lapsed and whose queue is empty.
    /// Returns how many rooms went.
    pub fn prune_idle_rooms(&self) -> usize {
        let now = self.clock.now();
        let before = self.rooms.len();
        self.rooms.retain(|_, room| {
            room.purge(now);
            !room.is_idle()
        });
        let pruned = before.saturating_sub(self.rooms.len());
        if pruned > 0 {
            debug!(pruned, "Dropped idle waiting rooms");
        }
        pruned
    }

    /// Number of events with a room in memory
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Current occupancy of one event's room
    pub fn snapshot(&self, event_id: &str) -> RoomSnapshot {
        let now = self.clock.now();
        let (queued, active) = self
            .rooms
            .get(event_id)
            .map(|room| {
                let live = room.sessions.values().filter(|s| s.is_live(now)).count();
                (room.queue.len(), live)
            })
            .unwrap_or((0, 0));
        RoomSnapshot {
            queued,
            active,
            capacity: self.config.max_active_per_event,
        }
    }

    fn estimated_wait_minutes(&self, position: usize) -> u64 {
        let per_position = self.config.wait_per_position.num_minutes().max(0) as u64;
        per_position.saturating_mul(position as u64)
    }

    fn record(&self, event_id: &str, room: &EventRoom, promoted: usize) {
        if promoted > 0 {
            metrics::counter!("waiting_room_promotions_total").increment(promoted as u64);
            info!(event_id, promoted, active = room.sessions.len(), "Waiting room promoted users");
        }
        let event = event_id.to_string();
        metrics::gauge!("waiting_room_queued", "event_id" => event.clone()).set(room.queue.len() as f64);
        metrics::gauge!("waiting_room_active", "event_id" => event).set(room.sessions.len() as f64);
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AdmissionState;
    use crate::shared::time::ManualClock;
    use std::sync::Arc;

    fn queue(cap: usize) -> (Arc<AdmissionQueue>, Arc<ManualClock>) {
        let clock = ManualClock::starting_now();
        let q = AdmissionQueue::new(
            AdmissionConfig {
                max_active_per_event: cap,
                ..AdmissionConfig::default()
            },
            clock.clone(),
        );
        (Arc::new(q), clock)
    }

    #[test]
    fn first_users_are_admitted_up_to_cap() {
        let (q, _) = queue(2);
        assert_eq!(q.join("E", "a").unwrap().state, AdmissionState::Active);
        assert_eq!(q.join("E", "b").unwrap().state, AdmissionState::Active);

        let c = q.join("E", "c").unwrap();
        assert_eq!(c.state, AdmissionState::Waiting);
        assert_eq!(c.position, Some(1));
        assert_eq!(q.snapshot("E"), RoomSnapshot { queued: 1, active: 2, capacity: 2 });
    }

    #[test]
    fn rejoining_keeps_place() {
        let (q, _) = queue(1);
        q.join("E", "a").unwrap();
        q.join("E", "b").unwrap();
        q.join("E", "c").unwrap();

        let again = q.join("E", "c").unwrap();
        assert_eq!(again.position, Some(2));
        let active = q.join("E", "a").unwrap();
        assert_eq!(active.state, AdmissionState::Active);
        assert_eq!(active.position, Some(0));
        assert_eq!(q.snapshot("E").queued, 2);
    }

    #[test]
    fn status_of_stranger_is_not_in_queue() {
        let (q, _) = queue(1);
        let s = q.status("E", "nobody").unwrap();
        assert_eq!(s.state, AdmissionState::NotInQueue);
        assert_eq!(s.position, None);

        q.join("E", "a").unwrap();
        assert_eq!(q.status("E", "nobody").unwrap().state, AdmissionState::NotInQueue);
    }

    #[test]
    fn waiting_status_estimates_two_minutes_per_position() {
        let (q, _) = queue(1);
        q.join("E", "a").unwrap();
        q.join("E", "b").unwrap();
        q.join("E", "c").unwrap();

        let c = q.status("E", "c").unwrap();
        assert_eq!(c.state, AdmissionState::Waiting);
        assert_eq!(c.position, Some(2));
        assert_eq!(c.estimated_wait_minutes, Some(4));
    }

    #[test]
    fn single_slot_scenario_promotes_in_order() {
        let (q, clock) = queue(1);

        assert_eq!(q.join("E", "A").unwrap().state, AdmissionState::Active);
        let b = q.join("E", "B").unwrap();
        assert_eq!((b.state, b.position), (AdmissionState::Waiting, Some(1)));

        clock.advance(Duration::minutes(10));
        let b = q.status("E", "B").unwrap();
        assert_eq!(b.state, AdmissionState::Active);
        assert_eq!(b.position, Some(0));

        // A's session lapsed and A was not re-queued
        assert_eq!(q.status("E", "A").unwrap().state, AdmissionState::NotInQueue);
    }

    #[test]
    fn promotion_is_fifo() {
        let (q, clock) = queue(1);
        q.join("E", "holder").unwrap();
        q.join("E", "A").unwrap();
        q.join("E", "B").unwrap();

        clock.advance(Duration::minutes(11));
        // B polls first, but A is ahead
        let b = q.status("E", "B").unwrap();
        assert_eq!((b.state, b.position), (AdmissionState::Waiting, Some(1)));
        assert_eq!(q.status("E", "A").unwrap().state, AdmissionState::Active);
    }

    #[test]
    fn events_are_independent() {
        let (q, _) = queue(1);
        q.join("E1", "a").unwrap();
        assert_eq!(q.join("E2", "b").unwrap().state, AdmissionState::Active);
        assert_eq!(q.snapshot("E1").active, 1);
        assert_eq!(q.snapshot("E2").active, 1);
        assert_eq!(q.snapshot("E3"), RoomSnapshot { queued: 0, active: 0, capacity: 1 });
    }

    #[test]
    fn blank_ids_are_rejected() {
        let (q, _) = queue(1);
        assert!(q.join("", "a").is_err());
        assert!(q.status("E", " ").is_err());
    }

    #[tokio::test]
    async fn concurrent_joins_never_exceed_cap() {
        let (q, clock) = queue(3);
        let handles: Vec<_> = (0..40)
            .map(|i| {
                let q = q.clone();
                tokio::spawn(async move {
                    let user = format!("user-{i}");
                    let status = q.join("E", &user).unwrap();
                    (user, status)
                })
            })
            .collect();

        let mut active = 0;
        let mut waiting = Vec::new();
        for handle in handles {
            let (user, status) = handle.await.unwrap();
            match status.state {
                AdmissionState::Active => active += 1,
                AdmissionState::Waiting => waiting.push(user),
                AdmissionState::NotInQueue => panic!("joined user reported not in queue"),
            }
        }
        assert_eq!(active, 3);
        assert_eq!(waiting.len(), 37);
        assert_eq!(q.snapshot("E"), RoomSnapshot { queued: 37, active: 3, capacity: 3 });

        // All three sessions lapse; one poll refills every slot
        clock.advance(Duration::minutes(10));
        q.status("E", &waiting[0]).unwrap();
        assert_eq!(q.snapshot("E"), RoomSnapshot { queued: 34, active: 3, capacity: 3 });
    }

    #[test]
    fn idle_room_is_dropped_when_polled() {
        let (q, clock) = queue(2);
        for n in 0..50 {
            q.join(&format!("E{n}"), "a").unwrap();
        }
        assert_eq!(q.room_count(), 50);

        clock.advance(Duration::minutes(10));
        for n in 0..50 {
            let s = q.status(&format!("E{n}"), "a").unwrap();
            assert_eq!(s.state, AdmissionState::NotInQueue);
        }
        assert_eq!(q.room_count(), 0);
        assert_eq!(q.snapshot("E0"), RoomSnapshot { queued: 0, active: 0, capacity: 2 });

        // A fresh join recreates the room
        assert_eq!(q.join("E0", "b").unwrap().state, AdmissionState::Active);
        assert_eq!(q.room_count(), 1);
    }

    #[test]
    fn prune_keeps_rooms_with_live_users() {
        let (q, clock) = queue(1);
        q.join("old", "a").unwrap();
        clock.advance(Duration::minutes(5));
        q.join("busy", "b").unwrap();
        q.join("busy", "c").unwrap();

        clock.advance(Duration::minutes(6));
        assert_eq!(q.prune_idle_rooms(), 1);
        assert_eq!(q.room_count(), 1);
        assert_eq!(q.snapshot("busy"), RoomSnapshot { queued: 1, active: 1, capacity: 1 });

        // Once b's session lapses, c is promoted on the next poll
        clock.advance(Duration::minutes(5));
        assert_eq!(q.status("busy", "c").unwrap().state, AdmissionState::Active);
    }
}
