//! Reservation HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::application::ReservationService;
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult};
use crate::interfaces::http::modules::seats::ReservationDto;

use super::dto::*;

#[derive(Clone)]
pub struct ReservationAppState {
    pub reservations: Arc<ReservationService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{reservation_id}",
    tag = "Reservations",
    params(("reservation_id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation with seat details", body = ApiResponse<ReservationDetailsDto>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<ReservationAppState>,
    Path(reservation_id): Path<String>,
) -> ApiResult<ReservationDetailsDto> {
    let details = state
        .reservations
        .get_detailed(&reservation_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(details.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/cancel",
    tag = "Reservations",
    params(("reservation_id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation released (no-op if already expired or completed)", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ReservationAppState>,
    Path(reservation_id): Path<String>,
) -> ApiResult<ReservationDto> {
    let reservation = state
        .reservations
        .cancel(&reservation_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(reservation.into())))
}
