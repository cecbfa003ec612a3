//! Seat domain entity

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Seat status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeatStatus {
    /// Free to be held
    Available,
    /// Held by exactly one active reservation
    Reserved,
    /// Bought; terminal
    Sold,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "reserved" => Some(Self::Reserved),
            "sold" => Some(Self::Sold),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single seat of an event's seat map
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub id: String,
    pub event_id: String,
    pub section: String,
    pub row: String,
    pub number: u32,
    pub price: Decimal,
    pub status: SeatStatus,
    /// Reservation currently holding (or having bought) this seat.
    /// Set iff status is `Reserved` or `Sold`.
    pub reservation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Seat {
    pub fn new(
        event_id: impl Into<String>,
        section: impl Into<String>,
        row: impl Into<String>,
        number: u32,
        price: Decimal,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_id: event_id.into(),
            section: section.into(),
            row: row.into(),
            number,
            price,
            status: SeatStatus::Available,
            reservation_id: None,
            created_at: Utc::now(),
        }
    }

    /// Seat-map order: section, then row (numeric rows compare as numbers),
    /// then seat number.
    pub fn cmp_position(&self, other: &Seat) -> Ordering {
        self.section
            .cmp(&other.section)
            .then_with(|| match (self.row.parse::<u32>(), other.row.parse::<u32>()) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => self.row.cmp(&other.row),
            })
            .then_with(|| self.number.cmp(&other.number))
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    /// Whether `reservation_id` is the one holding this seat.
    pub fn is_held_by(&self, reservation_id: &str) -> bool {
        self.status == SeatStatus::Reserved
            && self.reservation_id.as_deref() == Some(reservation_id)
    }

    pub fn is_sold_to(&self, reservation_id: &str) -> bool {
        self.status == SeatStatus::Sold && self.reservation_id.as_deref() == Some(reservation_id)
    }

    /// available -> reserved. Returns false if the seat was not available.
    pub fn hold(&mut self, reservation_id: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        self.status = SeatStatus::Reserved;
        self.reservation_id = Some(reservation_id.to_string());
        true
    }

    /// reserved -> available, only for the holding reservation.
    pub fn release(&mut self, reservation_id: &str) -> bool {
        if !self.is_held_by(reservation_id) {
            return false;
        }
        self.status = SeatStatus::Available;
        self.reservation_id = None;
        true
    }

    /// reserved -> sold, only for the holding reservation.
    pub fn sell(&mut self, reservation_id: &str) -> bool {
        if !self.is_held_by(reservation_id) {
            return false;
        }
        self.status = SeatStatus::Sold;
        true
    }

    /// sold -> available. Only used to undo a checkout that failed midway.
    pub fn unsell(&mut self, reservation_id: &str) -> bool {
        if !self.is_sold_to(reservation_id) {
            return false;
        }
        self.status = SeatStatus::Available;
        self.reservation_id = None;
        true
    }
}
