//! Seat DTOs

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{Reservation, Seat};

/// One seat of an event's seat map
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeatDto {
    pub id: String,
    pub event_id: String,
    pub section: String,
    pub row: String,
    pub number: u32,
    pub price: f64,
    /// available, reserved or sold
    pub status: String,
}

impl From<Seat> for SeatDto {
    fn from(s: Seat) -> Self {
        Self {
            id: s.id,
            event_id: s.event_id,
            section: s.section,
            row: s.row,
            number: s.number,
            price: s.price.to_f64().unwrap_or_default(),
            status: s.status.as_str().to_string(),
        }
    }
}

/// Request to hold seats
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSeatsRequest {
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub event_id: String,
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 50, message = "must list between 1 and 50 seats"))]
    pub seat_ids: Vec<String>,
}

/// A seat hold
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub seat_ids: Vec<String>,
    /// active, expired or completed
    pub status: String,
    pub created_at: String,
    pub expires_at: String,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            event_id: r.event_id,
            seat_ids: r.seat_ids,
            status: r.status.as_str().to_string(),
            created_at: r.created_at.to_rfc3339(),
            expires_at: r.expires_at.to_rfc3339(),
        }
    }
}
