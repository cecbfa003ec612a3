//! Purchase and ticket domain entities

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Payment method recorded when the caller does not name one
pub const DEFAULT_PAYMENT_METHOD: &str = "credit_card";

/// Payment details as submitted at checkout. No gateway is contacted;
/// payment success is assumed.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDetails {
    pub method: String,
    /// Raw payload, stored alongside the purchase
    pub raw: serde_json::Value,
}

impl PaymentDetails {
    pub fn from_json(raw: serde_json::Value) -> Self {
        let method = raw
            .get("method")
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
            .to_string();
        Self { method, raw }
    }
}

/// Payment status of a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

/// A finalized checkout
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub reservation_id: String,
    /// Seat prices plus service fee
    pub total: Decimal,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    /// Gateway-style transaction reference
    pub transaction_id: String,
    pub payment_details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Active,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
        }
    }
}

/// Admission to one sold seat
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: String,
    pub purchase_id: String,
    pub seat_id: String,
    pub event_id: String,
    pub user_id: String,
    /// Unique code printed on the ticket and checked at the door
    pub scan_code: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn issue(purchase: &Purchase, seat_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            purchase_id: purchase.id.clone(),
            seat_id: seat_id.into(),
            event_id: purchase.event_id.clone(),
            user_id: purchase.user_id.clone(),
            scan_code: uuid::Uuid::new_v4().to_string(),
            status: TicketStatus::Active,
            created_at: purchase.created_at,
        }
    }
}

/// Apply a percentage service fee to a subtotal.
///
/// `fee_percent = 10` means the buyer pays 110% of the seat prices.
pub fn total_with_service_fee(subtotal: Decimal, fee_percent: u32) -> Decimal {
    let multiplier = Decimal::ONE + Decimal::new(i64::from(fee_percent), 2);
    (subtotal * multiplier).round_dp(2)
}
