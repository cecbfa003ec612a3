//! Ticket wallet DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::TicketWithSeat;
use crate::interfaces::http::modules::seats::SeatDto;

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TicketsQuery {
    /// Owner of the tickets
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub user_id: String,
}

/// A ticket together with the seat it admits to
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletTicketDto {
    pub id: String,
    pub purchase_id: String,
    pub event_id: String,
    pub scan_code: String,
    pub status: String,
    pub created_at: String,
    pub seat: Option<SeatDto>,
}

impl From<TicketWithSeat> for WalletTicketDto {
    fn from(t: TicketWithSeat) -> Self {
        let TicketWithSeat { ticket, seat } = t;
        Self {
            id: ticket.id,
            purchase_id: ticket.purchase_id,
            event_id: ticket.event_id,
            scan_code: ticket.scan_code,
            status: ticket.status.as_str().to_string(),
            created_at: ticket.created_at.to_rfc3339(),
            seat: seat.map(SeatDto::from),
        }
    }
}
