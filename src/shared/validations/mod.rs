use std::collections::HashSet;

use crate::shared::errors::DomainError;

/// Reject empty or whitespace-only identifiers.
pub fn validate_identifier(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// A seat hold needs at least one seat, each named once.
pub fn validate_seat_ids(seat_ids: &[String]) -> Result<(), DomainError> {
    if seat_ids.is_empty() {
        return Err(DomainError::Validation(
            "seatIds must contain at least one seat".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(seat_ids.len());
    for id in seat_ids {
        validate_identifier("seatIds[]", id)?;
        if !seen.insert(id.as_str()) {
            return Err(DomainError::Validation(format!(
                "seat {} requested more than once",
                id
            )));
        }
    }
    Ok(())
}
