//! Reservation DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::ReservationDetails;
use crate::interfaces::http::modules::seats::{ReservationDto, SeatDto};

/// A reservation with the seats it holds
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetailsDto {
    #[serde(flatten)]
    pub reservation: ReservationDto,
    pub seats: Vec<SeatDto>,
}

impl From<ReservationDetails> for ReservationDetailsDto {
    fn from(d: ReservationDetails) -> Self {
        Self {
            reservation: d.reservation.into(),
            seats: d.seats.into_iter().map(SeatDto::from).collect(),
        }
    }
}
