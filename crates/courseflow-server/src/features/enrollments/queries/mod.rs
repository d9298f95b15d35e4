pub mod get_enrollment;

pub use get_enrollment::{GetEnrollmentError, GetEnrollmentQuery, GetEnrollmentResponse};
