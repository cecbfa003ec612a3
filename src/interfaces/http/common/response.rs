//! Uniform JSON envelope and domain error mapping

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Envelope for every API response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` when the request succeeded
    pub success: bool,
    /// Payload; `null` on error
    pub data: Option<T>,
    /// Error description; omitted on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error half of a handler result
pub type ApiError<T> = (StatusCode, Json<ApiResponse<T>>);

/// Handler result carrying the envelope on both sides
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError<T>>;

/// HTTP status for a domain failure
pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } | DomainError::ReservationNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::SeatUnavailable { .. } | DomainError::ReservationNotActive { .. } => {
            StatusCode::CONFLICT
        }
        DomainError::ReservationExpired(_) => StatusCode::GONE,
        DomainError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Map a domain failure onto the envelope. Storage details stay in the log.
pub fn domain_error<T>(err: DomainError) -> ApiError<T> {
    let status = status_for(&err);
    let message = match &err {
        DomainError::StorageUnavailable(detail) => {
            tracing::error!(error = %detail, "Storage unavailable");
            "Storage temporarily unavailable, please retry".to_string()
        }
        other => other.to_string(),
    };
    (status, Json(ApiResponse::error(message)))
}
