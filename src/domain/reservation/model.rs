//! Reservation domain entity

use chrono::{DateTime, Duration, Utc};

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// Seats are held until `expires_at`
    Active,
    /// Hold lapsed or was cancelled; seats released
    Expired,
    /// Checkout finalized; seats sold
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A time-bounded hold on a set of seats
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    /// Held seats, in the order they were requested
    pub seat_ids: Vec<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(
        user_id: impl Into<String>,
        event_id: impl Into<String>,
        seat_ids: Vec<String>,
        now: DateTime<Utc>,
        hold: Duration,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            event_id: event_id.into(),
            seat_ids,
            status: ReservationStatus::Active,
            created_at: now,
            expires_at: now + hold,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Active but past its expiry timestamp; the expiry transition is due.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.expires_at
    }

    pub fn expire(&mut self) {
        self.status = ReservationStatus::Expired;
    }

    pub fn complete(&mut self) {
        self.status = ReservationStatus::Completed;
    }
}

// ── Tests ──────────────────────────────────────────────────────
