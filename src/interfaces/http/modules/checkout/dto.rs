//! Checkout DTOs

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{Purchase, Ticket};

/// Request to finalize a reservation
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub reservation_id: String,
    /// Payment payload, must be a JSON object; `method` defaults to
    /// `credit_card`
    #[schema(value_type = Object)]
    pub payment_details: serde_json::Map<String, serde_json::Value>,
}

/// An issued ticket
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketDto {
    pub id: String,
    pub purchase_id: String,
    pub seat_id: String,
    pub event_id: String,
    pub scan_code: String,
    pub status: String,
    pub created_at: String,
}

impl From<Ticket> for TicketDto {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            purchase_id: t.purchase_id,
            seat_id: t.seat_id,
            event_id: t.event_id,
            scan_code: t.scan_code,
            status: t.status.as_str().to_string(),
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

/// A completed purchase and its tickets
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDto {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub reservation_id: String,
    /// Seat prices plus service fee
    pub total: f64,
    pub payment_method: String,
    pub payment_status: String,
    pub transaction_id: String,
    pub created_at: String,
    pub tickets: Vec<TicketDto>,
}

impl PurchaseDto {
    pub fn new(p: Purchase, tickets: Vec<Ticket>) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            event_id: p.event_id,
            reservation_id: p.reservation_id,
            total: p.total.to_f64().unwrap_or_default(),
            payment_method: p.payment_method,
            payment_status: p.payment_status.as_str().to_string(),
            transaction_id: p.transaction_id,
            created_at: p.created_at.to_rfc3339(),
            tickets: tickets.into_iter().map(TicketDto::from).collect(),
        }
    }
}
