//! Waiting room DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::AdmissionStatus;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinWaitingRoomRequest {
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub event_id: String,
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub user_id: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WaitingRoomQuery {
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub event_id: String,
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub user_id: String,
}

/// Where a user stands in an event's waiting room
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionStatusDto {
    /// waiting, active or not_in_queue
    pub status: String,
    /// 0 when active, 1-based queue position when waiting
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_expires_at: Option<String>,
}

impl From<AdmissionStatus> for AdmissionStatusDto {
    fn from(s: AdmissionStatus) -> Self {
        Self {
            status: s.state.as_str().to_string(),
            position: s.position,
            estimated_wait_minutes: s.estimated_wait_minutes,
            session_expires_at: s.session_expires_at.map(|t| t.to_rfc3339()),
        }
    }
}
