//! Waiting-room entities

use chrono::{DateTime, Utc};

/// A user waiting for admission to an event
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub user_id: String,
    pub event_id: String,
    pub enqueued_at: DateTime<Utc>,
}

/// An admitted shopper's time-limited slot
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub expires_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Where a user stands for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionState {
    NotInQueue,
    Waiting,
    Active,
}

impl AdmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInQueue => "not_in_queue",
            Self::Waiting => "waiting",
            Self::Active => "active",
        }
    }
}

impl std::fmt::Display for AdmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a join or status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionStatus {
    pub state: AdmissionState,
    /// 0 when active, 1-based queue position when waiting, `None` otherwise
    pub position: Option<usize>,
    /// Rough estimate only; present while waiting on a status poll
    pub estimated_wait_minutes: Option<u64>,
    /// Expiry of the user's session while active
    pub session_expires_at: Option<DateTime<Utc>>,
}

impl AdmissionStatus {
    pub fn active(session: &ActiveSession) -> Self {
        Self {
            state: AdmissionState::Active,
            position: Some(0),
            estimated_wait_minutes: None,
            session_expires_at: Some(session.expires_at),
        }
    }

    pub fn waiting(position: usize, estimated_wait_minutes: Option<u64>) -> Self {
        Self {
            state: AdmissionState::Waiting,
            position: Some(position),
            estimated_wait_minutes,
            session_expires_at: None,
        }
    }

    pub fn not_in_queue() -> Self {
        Self {
            state: AdmissionState::NotInQueue,
            position: None,
            estimated_wait_minutes: None,
            session_expires_at: None,
        }
    }
}

/// Occupancy of one event's waiting room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub queued: usize,
    pub active: usize,
    pub capacity: usize,
}
