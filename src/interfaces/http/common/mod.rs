//! Shared HTTP building blocks

mod response;
mod validated_json;

pub use response::{domain_error, status_for, ApiError, ApiResponse, ApiResult};
pub use validated_json::{ValidatedJson, ValidatedQuery, ValidationRejection};
