//! Course catalog reads

pub mod queries;
pub mod routes;

pub use queries::{GetCourseOutlineError, GetCourseOutlineQuery};

pub use routes::courses_routes;
