//! Course enrollment
//!
//! - `commands::enroll` - enroll the caller and open the first lesson
//! - `queries::get_enrollment` - read a user's enrollment in a course

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{EnrollCommand, EnrollError, EnrollResponse};
pub use queries::{GetEnrollmentError, GetEnrollmentQuery, GetEnrollmentResponse};

pub use routes::enrollments_routes;
