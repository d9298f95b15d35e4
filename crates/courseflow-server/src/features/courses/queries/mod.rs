pub mod get_outline;

pub use get_outline::{GetCourseOutlineError, GetCourseOutlineQuery};
