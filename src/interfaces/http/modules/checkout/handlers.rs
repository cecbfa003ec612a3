//! Checkout handler

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::application::ReservationService;
use crate::domain::PaymentDetails;
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult, ValidatedJson};

use super::dto::*;

#[derive(Clone)]
pub struct CheckoutState {
    pub reservations: Arc<ReservationService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    tag = "Checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Purchase completed", body = ApiResponse<PurchaseDto>),
        (status = 400, description = "Malformed body or missing payment details"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not active"),
        (status = 410, description = "Reservation hold has expired")
    )
)]
pub async fn checkout(
    State(state): State<CheckoutState>,
    ValidatedJson(request): ValidatedJson<CheckoutRequest>,
) -> ApiResult<PurchaseDto> {
    let payment = PaymentDetails::from_json(serde_json::Value::Object(request.payment_details));
    let checkout = state
        .reservations
        .finalize(&request.reservation_id, payment)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(PurchaseDto::new(
        checkout.purchase,
        checkout.tickets,
    ))))
}
