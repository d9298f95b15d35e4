//! Shared utilities and types for feature modules
//!
//! - **identity**: caller identity extractor
//! - **json**: JSON body extractor with enveloped rejections
//! - **validation**: request validation helpers
//! - **error_helpers**: database error classification
//! - **test_helpers**: PostgreSQL fixtures (test-only)

pub mod error_helpers;
pub mod identity;
pub mod json;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use identity::CurrentActor;
pub use json::ApiJson;
pub use validation::{validate_id, validate_optional_id, IdValidationError};
