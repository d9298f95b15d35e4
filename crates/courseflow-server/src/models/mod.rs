//! Database models
//!
//! Catalog rows (courses, chapters, lessons, placements) are read-only here;
//! enrollments and progress rows are written by the enrollment and progress
//! commands only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Course model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    pub is_published: bool,
}

/// Chapter model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Chapter {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: i32,
}

/// Lesson model
///
/// Content lives in lesson versions; only the active version's id is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LessonRef {
    pub id: Uuid,
    pub title: String,
    pub active_version_id: Option<Uuid>,
}

/// A lesson placed at a position inside a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LessonPlacement {
    pub lesson_id: Uuid,
    pub chapter_id: Uuid,
    pub course_id: Uuid,
    pub position: i32,
    /// Version that was active when the lesson was placed
    pub lesson_version_id: Uuid,
    pub lesson_title: String,
}

/// Chapter with its lesson placements, ordered by position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterOutline {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: i32,
    pub lessons: Vec<LessonPlacement>,
}

/// Course with its full chapter/lesson tree, ordered by position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutline {
    #[serde(flatten)]
    pub course: Course,
    pub chapters: Vec<ChapterOutline>,
}

impl ChapterOutline {
    /// Attach placements to a chapter row, sorted by position
    pub fn assemble(chapter: Chapter, mut lessons: Vec<LessonPlacement>) -> Self {
        lessons.sort_by_key(|p| p.position);
        Self {
            id: chapter.id,
            course_id: chapter.course_id,
            title: chapter.title,
            position: chapter.position,
            lessons,
        }
    }
}

impl CourseOutline {
    /// Build the ordered tree from flat rows.
    ///
    /// Placements whose chapter is not in `chapters` are dropped.
    pub fn assemble(
        course: Course,
        mut chapters: Vec<Chapter>,
        placements: Vec<LessonPlacement>,
    ) -> Self {
        chapters.sort_by_key(|c| c.position);

        let mut by_chapter: HashMap<Uuid, Vec<LessonPlacement>> = HashMap::new();
        for placement in placements {
            by_chapter.entry(placement.chapter_id).or_default().push(placement);
        }

        let chapters = chapters
            .into_iter()
            .map(|chapter| {
                let lessons = by_chapter.remove(&chapter.id).unwrap_or_default();
                ChapterOutline::assemble(chapter, lessons)
            })
            .collect();

        Self { course, chapters }
    }

    pub fn lesson_count(&self) -> usize {
        self.chapters.iter().map(|c| c.lessons.len()).sum()
    }
}

/// One enrollment per (user, course)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CourseEnrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    /// Lesson the student should resume at
    pub current_lesson_id: Uuid,
    pub last_completed_id: Option<Uuid>,
    /// 0-100, recomputed on every completion event
    pub progress_percentage: i32,
}

/// Values for a new enrollment row
#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub current_lesson_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

/// One progress row per (user, course, lesson)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StudentProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_version_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
    /// Seconds spent on the lesson, reported by the client
    pub time_spent: i64,
}

/// Create-or-update request for a progress row.
///
/// On insert the row takes `lesson_version_id`; on update the pinned version is
/// kept. `completed` only ever moves false to true, and `completed_at` is set to
/// `touched_at` whenever `completed` is requested, including re-completions.
#[derive(Debug, Clone)]
pub struct ProgressUpsert {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_version_id: Uuid,
    pub completed: bool,
    pub touched_at: DateTime<Utc>,
}

impl ProgressUpsert {
    /// Row to insert when none exists yet
    pub fn new_row(&self) -> StudentProgress {
        StudentProgress {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            course_id: self.course_id,
            lesson_id: self.lesson_id,
            lesson_version_id: self.lesson_version_id,
            completed: self.completed,
            completed_at: self.completed.then_some(self.touched_at),
            last_accessed: self.touched_at,
            time_spent: 0,
        }
    }

    /// Apply this touch to an existing row
    pub fn apply_to(&self, row: &mut StudentProgress) {
        if self.completed {
            row.completed = true;
            row.completed_at = Some(self.touched_at);
        }
        row.last_accessed = self.touched_at;
    }
}
