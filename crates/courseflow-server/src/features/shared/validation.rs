//! Shared validation utilities
//!
//! Request structs are validated before any store access.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during identifier validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
}

/// Reject the nil UUID, which deserializes from an all-zero id but never
/// names a real row.
pub fn validate_id(id: Uuid, field: &'static str) -> Result<(), IdValidationError> {
    if id.is_nil() {
        return Err(IdValidationError::Missing { field });
    }
    Ok(())
}

/// Validate an optional identifier: absent is fine, nil is not
pub fn validate_optional_id(id: Option<Uuid>, field: &'static str) -> Result<(), IdValidationError> {
    match id {
        Some(id) => validate_id(id, field),
        None => Ok(()),
    }
}
