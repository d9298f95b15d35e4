//! Lesson progress tracking
//!
//! - `commands::mark_lesson_complete` - record a lesson touch or completion
//! - `queries::get_lesson_progress` - one progress row
//! - `queries::get_course_progress` - enrollment summary with all rows

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    MarkLessonCompleteCommand, MarkLessonCompleteError, MarkLessonCompleteResponse,
};
pub use queries::{
    GetCourseProgressError, GetCourseProgressQuery, GetCourseProgressResponse,
    GetLessonProgressError, GetLessonProgressQuery, GetLessonProgressResponse,
};

pub use routes::progress_routes;
