//! Database error classification helpers
//!
//! # Examples
//!
//! ```rust,ignore
//! use courseflow_server::features::shared::error_helpers::is_unique_violation;
//!
//! match sqlx::query("INSERT ...").execute(&pool).await {
//!     Err(e) if is_unique_violation(&e) => { /* duplicate */ }
//!     other => { /* ... */ }
//! }
//! ```

use sqlx::Error as SqlxError;

/// Result of checking for a database constraint violation
#[derive(Debug)]
pub enum ConstraintViolation {
    UniqueViolation,
    ForeignKeyViolation,
    /// Not a constraint violation
    Other,
}

/// Classify a sqlx error by the constraint it violated, if any
pub fn check_constraint_violation(error: &SqlxError) -> ConstraintViolation {
    if let SqlxError::Database(db_err) = error {
        if db_err.is_unique_violation() {
            return ConstraintViolation::UniqueViolation;
        }
        if db_err.is_foreign_key_violation() {
            return ConstraintViolation::ForeignKeyViolation;
        }
    }
    ConstraintViolation::Other
}

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    matches!(
        check_constraint_violation(error),
        ConstraintViolation::UniqueViolation
    )
}
