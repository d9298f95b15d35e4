pub mod mark_lesson_complete;

pub use mark_lesson_complete::{
    MarkLessonCompleteCommand, MarkLessonCompleteError, MarkLessonCompleteResponse,
};
