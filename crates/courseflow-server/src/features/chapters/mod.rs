//! Chapter navigation

pub mod queries;
pub mod routes;

pub use queries::{GetChapterNextLessonError, GetChapterNextLessonQuery};

pub use routes::chapters_routes;
