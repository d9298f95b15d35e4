pub mod get_course_progress;
pub mod get_lesson_progress;

pub use get_course_progress::{
    GetCourseProgressError, GetCourseProgressQuery, GetCourseProgressResponse,
};
pub use get_lesson_progress::{
    GetLessonProgressError, GetLessonProgressQuery, GetLessonProgressResponse,
};
