pub mod enroll;

pub use enroll::{EnrollCommand, EnrollError, EnrollResponse};
