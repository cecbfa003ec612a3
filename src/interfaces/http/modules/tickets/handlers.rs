//! Ticket wallet handler

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::application::TicketService;
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult, ValidatedQuery};

use super::dto::*;

#[derive(Clone)]
pub struct TicketsState {
    pub tickets: Arc<TicketService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    tag = "Tickets",
    params(TicketsQuery),
    responses(
        (status = 200, description = "User's tickets, newest first", body = ApiResponse<Vec<WalletTicketDto>>),
        (status = 400, description = "Missing userId"),
        (status = 422, description = "Blank or oversized userId")
    )
)]
pub async fn list_tickets(
    State(state): State<TicketsState>,
    ValidatedQuery(query): ValidatedQuery<TicketsQuery>,
) -> ApiResult<Vec<WalletTicketDto>> {
    let tickets = state
        .tickets
        .list_for_user(&query.user_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        tickets.into_iter().map(WalletTicketDto::from).collect(),
    )))
}
