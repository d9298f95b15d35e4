//! Error types shared across Courseflow crates

use thiserror::Error;

/// Result type alias for Courseflow operations
pub type Result<T> = std::result::Result<T, CourseflowError>;

/// Main error type for Courseflow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CourseflowError {
    #[error("Invalid user id '{0}': expected a UUID")]
    InvalidUserId(String),

    #[error("Invalid admin flag '{0}': expected true or false")]
    InvalidAdminFlag(String),
}
