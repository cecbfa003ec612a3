//! Seat map and seat hold handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::application::{ReservationService, SeatMapService};
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult, ValidatedJson};

use super::dto::*;

#[derive(Clone)]
pub struct SeatsState {
    pub seat_map: Arc<SeatMapService>,
    pub reservations: Arc<ReservationService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/seats/{event_id}",
    tag = "Seats",
    params(("event_id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Seats in section/row/number order", body = ApiResponse<Vec<SeatDto>>),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_seats(
    State(state): State<SeatsState>,
    Path(event_id): Path<String>,
) -> ApiResult<Vec<SeatDto>> {
    let seats = state.seat_map.list(&event_id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        seats.into_iter().map(SeatDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/seats/reserve",
    tag = "Seats",
    request_body = ReserveSeatsRequest,
    responses(
        (status = 200, description = "Seats held", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "One or more seats are not available"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn reserve_seats(
    State(state): State<SeatsState>,
    ValidatedJson(request): ValidatedJson<ReserveSeatsRequest>,
) -> ApiResult<ReservationDto> {
    let reservation = state
        .reservations
        .reserve(&request.event_id, &request.user_id, &request.seat_ids)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(reservation.into())))
}
