//! Waiting room handlers

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::application::AdmissionQueue;
use crate::interfaces::http::common::{
    domain_error, ApiResponse, ApiResult, ValidatedJson, ValidatedQuery,
};

use super::dto::*;

#[derive(Clone)]
pub struct WaitingRoomState {
    pub admission: Arc<AdmissionQueue>,
}

#[utoipa::path(
    post,
    path = "/api/v1/waiting-room/join",
    tag = "Waiting Room",
    request_body = JoinWaitingRoomRequest,
    responses(
        (status = 200, description = "Active session or queue position", body = ApiResponse<AdmissionStatusDto>),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn join_waiting_room(
    State(state): State<WaitingRoomState>,
    ValidatedJson(request): ValidatedJson<JoinWaitingRoomRequest>,
) -> ApiResult<AdmissionStatusDto> {
    let status = state
        .admission
        .join(&request.event_id, &request.user_id)
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(status.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/waiting-room/status",
    tag = "Waiting Room",
    params(WaitingRoomQuery),
    responses(
        (status = 200, description = "Current admission status", body = ApiResponse<AdmissionStatusDto>),
        (status = 400, description = "Missing identifiers"),
        (status = 422, description = "Blank or oversized identifiers")
    )
)]
pub async fn waiting_room_status(
    State(state): State<WaitingRoomState>,
    ValidatedQuery(query): ValidatedQuery<WaitingRoomQuery>,
) -> ApiResult<AdmissionStatusDto> {
    let status = state
        .admission
        .status(&query.event_id, &query.user_id)
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(status.into())))
}
