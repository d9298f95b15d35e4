pub mod next_lesson;

pub use next_lesson::{GetChapterNextLessonError, GetChapterNextLessonQuery};
