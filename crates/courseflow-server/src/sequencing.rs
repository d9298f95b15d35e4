//! Lesson ordering and access gating
//!
//! Pure functions over catalog outlines and progress rows. Nothing here
//! touches the store, so it can run inside or outside a transaction.
//!
//! Chapters and placements are ordered ascending by `position`. Outlines from
//! the store are already sorted; the functions here sort again (stably) so
//! hand-built outlines behave the same. Equal positions keep input order.

use serde::{Deserialize, Serialize};

use crate::models::{ChapterOutline, CourseOutline, LessonPlacement, StudentProgress};

fn by_position<T>(items: &[T], position: impl Fn(&T) -> i32) -> Vec<&T> {
    let mut ordered: Vec<&T> = items.iter().collect();
    ordered.sort_by_key(|item| position(item));
    ordered
}

/// First placement of the first non-empty chapter.
///
/// `None` means the course has no lessons to enroll into.
pub fn first_lesson_of(course: &CourseOutline) -> Option<&LessonPlacement> {
    by_position(&course.chapters, |c| c.position)
        .into_iter()
        .find_map(|chapter| by_position(&chapter.lessons, |l| l.position).first().copied())
}

/// Where a student lands after a lesson within one chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStep<'a> {
    /// The chapter has no lessons
    EmptyChapter,
    /// No current lesson given: start at the top of the chapter
    First {
        lesson: &'a LessonPlacement,
        is_last: bool,
    },
    /// The current lesson is not placed in this chapter
    NotInChapter,
    /// The current lesson is the chapter's last one
    EndOfChapter,
    /// The lesson after the current one
    Next {
        lesson: &'a LessonPlacement,
        index: usize,
        is_last: bool,
    },
}

impl<'a> ChapterStep<'a> {
    pub fn lesson(&self) -> Option<&'a LessonPlacement> {
        match *self {
            ChapterStep::First { lesson, .. } | ChapterStep::Next { lesson, .. } => Some(lesson),
            _ => None,
        }
    }

    /// Position-order index of the returned lesson within the chapter
    pub fn target_index(&self) -> Option<usize> {
        match *self {
            ChapterStep::First { .. } => Some(0),
            ChapterStep::Next { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Not-found and empty chapters report `false`; running off the end
    /// reports `true`.
    pub fn is_last_in_chapter(&self) -> bool {
        match *self {
            ChapterStep::First { is_last, .. } | ChapterStep::Next { is_last, .. } => is_last,
            ChapterStep::EndOfChapter => true,
            ChapterStep::EmptyChapter | ChapterStep::NotInChapter => false,
        }
    }
}

/// Compute the lesson that follows `current_lesson_id` in `chapter`.
pub fn next_lesson_in_chapter(
    chapter: &ChapterOutline,
    current_lesson_id: Option<uuid::Uuid>,
) -> ChapterStep<'_> {
    let lessons = by_position(&chapter.lessons, |l| l.position);

    let Some(current_lesson_id) = current_lesson_id else {
        return match lessons.first().copied() {
            Some(first) => ChapterStep::First {
                lesson: first,
                is_last: lessons.len() == 1,
            },
            None => ChapterStep::EmptyChapter,
        };
    };

    let Some(current) = lessons.iter().position(|l| l.lesson_id == current_lesson_id) else {
        return ChapterStep::NotInChapter;
    };

    let last = lessons.len() - 1;
    if current >= last {
        return ChapterStep::EndOfChapter;
    }

    let index = current + 1;
    ChapterStep::Next {
        lesson: lessons[index],
        index,
        is_last: index == last,
    }
}

/// Whether an enrolled student may open the lesson at `target_index`.
///
/// The first lesson of a chapter is always open. Any later lesson requires
/// the student's progress row for the current lesson to be completed.
pub fn is_access_allowed(target_index: usize, current_progress: Option<&StudentProgress>) -> bool {
    target_index == 0 || current_progress.is_some_and(|p| p.completed)
}

/// `round(100 * completed / total)`, rounding halves up.
///
/// Returns `None` for a course without lessons. The result is clamped to
/// 0..=100.
pub fn completion_percentage(completed: i64, total: i64) -> Option<i32> {
    if total <= 0 {
        return None;
    }
    let completed = completed.clamp(0, total);
    let percentage = (completed * 200 + total) / (total * 2);
    Some(percentage as i32)
}

/// Serializable form of a [`ChapterStep`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextLesson {
    pub lesson: Option<LessonPlacement>,
    pub is_last_in_chapter: bool,
}

impl NextLesson {
    /// A gated or missing result
    pub fn none(is_last_in_chapter: bool) -> Self {
        Self {
            lesson: None,
            is_last_in_chapter,
        }
    }
}

impl From<ChapterStep<'_>> for NextLesson {
    fn from(step: ChapterStep<'_>) -> Self {
        Self {
            lesson: step.lesson().cloned(),
            is_last_in_chapter: step.is_last_in_chapter(),
        }
    }
}
