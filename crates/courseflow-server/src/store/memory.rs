//! In-process implementation of the learning store
//!
//! Transactions are serialised: [`LearningStore::begin`] takes an owned lock
//! on the whole state and works on a private copy, which replaces the shared
//! state on commit. This gives the same all-or-nothing visibility as a
//! serialisable database transaction. Uniqueness of enrollments and progress
//! rows is enforced on write.
//!
//! Individual store calls can be made to fail with [`MemoryStore::fail_on`].

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{LearningStore, StoreError, StoreResult, StoreTx};
use crate::models::{
    Chapter, ChapterOutline, Course, CourseEnrollment, CourseOutline, LessonPlacement, LessonRef,
    NewEnrollment, ProgressUpsert, StudentProgress,
};

/// Store calls that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    CreateEnrollment,
    UpdateEnrollment,
    UpsertProgress,
    CountCompleted,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    courses: Vec<Course>,
    chapters: Vec<Chapter>,
    lessons: Vec<LessonRef>,
    placements: Vec<LessonPlacement>,
    enrollments: Vec<CourseEnrollment>,
    progress: Vec<StudentProgress>,
}

/// Store holding all rows in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_points: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call at `point` fail with [`StoreError::Injected`]
    pub async fn fail_on(&self, point: FailPoint) {
        self.fail_points.lock().await.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.fail_points.lock().await.clear();
    }

    /// Start seeding a course into the catalog
    pub fn seed_course(&self, title: impl Into<String>) -> CourseSeed {
        CourseSeed {
            store: self.clone(),
            course: Course {
                id: Uuid::new_v4(),
                title: title.into(),
                description: None,
                short_description: None,
                image_url: None,
                is_published: true,
            },
            chapters: Vec::new(),
        }
    }

    /// Add a lesson that is not placed in any chapter
    pub async fn insert_lesson(&self, title: impl Into<String>, with_version: bool) -> Uuid {
        let lesson = LessonRef {
            id: Uuid::new_v4(),
            title: title.into(),
            active_version_id: with_version.then(Uuid::new_v4),
        };
        let id = lesson.id;
        self.state.lock().await.lessons.push(lesson);
        id
    }

    /// Committed enrollment rows
    pub async fn enrollments(&self) -> Vec<CourseEnrollment> {
        self.state.lock().await.enrollments.clone()
    }

    /// Committed progress rows
    pub async fn progress_rows(&self) -> Vec<StudentProgress> {
        self.state.lock().await.progress.clone()
    }

    async fn check(fail_points: &Mutex<HashSet<FailPoint>>, point: FailPoint) -> StoreResult<()> {
        if fail_points.lock().await.contains(&point) {
            tracing::warn!(?point, "Injected store failure");
            return Err(StoreError::Injected(point));
        }
        Ok(())
    }
}

#[async_trait]
impl LearningStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        Self::check(&self.fail_points, FailPoint::Begin).await?;

        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();

        Ok(Box::new(MemoryTx {
            guard,
            working,
            fail_points: self.fail_points.clone(),
        }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_points: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryTx {
    async fn check(&self, point: FailPoint) -> StoreResult<()> {
        MemoryStore::check(&self.fail_points, point).await
    }

    fn chapter_outline(&self, chapter: &Chapter) -> ChapterOutline {
        let lessons = self
            .working
            .placements
            .iter()
            .filter(|p| p.chapter_id == chapter.id)
            .cloned()
            .collect();
        ChapterOutline::assemble(chapter.clone(), lessons)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_course_with_chapters(
        &mut self,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseOutline>> {
        let Some(course) = self.working.courses.iter().find(|c| c.id == course_id) else {
            return Ok(None);
        };

        let chapters = self
            .working
            .chapters
            .iter()
            .filter(|c| c.course_id == course_id)
            .cloned()
            .collect();
        let placements = self
            .working
            .placements
            .iter()
            .filter(|p| p.course_id == course_id)
            .cloned()
            .collect();

        Ok(Some(CourseOutline::assemble(course.clone(), chapters, placements)))
    }

    async fn find_chapter_with_lessons(
        &mut self,
        chapter_id: Uuid,
    ) -> StoreResult<Option<ChapterOutline>> {
        Ok(self
            .working
            .chapters
            .iter()
            .find(|c| c.id == chapter_id)
            .map(|chapter| self.chapter_outline(chapter)))
    }

    async fn find_lesson(&mut self, lesson_id: Uuid) -> StoreResult<Option<LessonRef>> {
        Ok(self.working.lessons.iter().find(|l| l.id == lesson_id).cloned())
    }

    async fn count_course_lessons(&mut self, course_id: Uuid) -> StoreResult<i64> {
        let count = self
            .working
            .placements
            .iter()
            .filter(|p| p.course_id == course_id)
            .count();
        Ok(count as i64)
    }

    async fn find_enrollment(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseEnrollment>> {
        Ok(self
            .working
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    // Transactions already hold the store-wide lock
    async fn lock_enrollment(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseEnrollment>> {
        self.find_enrollment(user_id, course_id).await
    }

    async fn create_enrollment(&mut self, new: &NewEnrollment) -> StoreResult<CourseEnrollment> {
        self.check(FailPoint::CreateEnrollment).await?;

        let exists = self
            .working
            .enrollments
            .iter()
            .any(|e| e.user_id == new.user_id && e.course_id == new.course_id);
        if exists {
            return Err(StoreError::UniqueViolation(format!(
                "enrollment for user {} in course {}",
                new.user_id, new.course_id
            )));
        }

        let enrollment = CourseEnrollment {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            course_id: new.course_id,
            enrolled_at: new.enrolled_at,
            current_lesson_id: new.current_lesson_id,
            last_completed_id: None,
            progress_percentage: 0,
        };
        self.working.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn update_enrollment_on_completion(
        &mut self,
        enrollment_id: Uuid,
        last_completed_id: Option<Uuid>,
        progress_percentage: Option<i32>,
    ) -> StoreResult<CourseEnrollment> {
        self.check(FailPoint::UpdateEnrollment).await?;

        let enrollment = self
            .working
            .enrollments
            .iter_mut()
            .find(|e| e.id == enrollment_id)
            .ok_or_else(|| StoreError::RowNotFound(format!("enrollment {enrollment_id}")))?;

        if let Some(lesson_id) = last_completed_id {
            enrollment.last_completed_id = Some(lesson_id);
        }
        if let Some(percentage) = progress_percentage {
            enrollment.progress_percentage = percentage;
        }
        Ok(enrollment.clone())
    }

    async fn find_progress(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> StoreResult<Option<StudentProgress>> {
        Ok(self
            .working
            .progress
            .iter()
            .find(|p| p.user_id == user_id && p.course_id == course_id && p.lesson_id == lesson_id)
            .cloned())
    }

    async fn upsert_progress(&mut self, upsert: &ProgressUpsert) -> StoreResult<StudentProgress> {
        self.check(FailPoint::UpsertProgress).await?;

        let existing = self.working.progress.iter_mut().find(|p| {
            p.user_id == upsert.user_id
                && p.course_id == upsert.course_id
                && p.lesson_id == upsert.lesson_id
        });

        match existing {
            Some(row) => {
                upsert.apply_to(row);
                Ok(row.clone())
            },
            None => {
                let row = upsert.new_row();
                self.working.progress.push(row.clone());
                Ok(row)
            },
        }
    }

    async fn count_completed_lessons(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<i64> {
        self.check(FailPoint::CountCompleted).await?;

        let count = self
            .working
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.course_id == course_id && p.completed)
            .count();
        Ok(count as i64)
    }

    async fn list_progress(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Vec<StudentProgress>> {
        let mut rows: Vec<StudentProgress> = self
            .working
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.course_id == course_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.last_accessed);
        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.check(FailPoint::Commit).await?;

        let MemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

/// Seeded course: ids of everything created by [`CourseSeed::insert`]
#[derive(Debug, Clone)]
pub struct SeededCourse {
    pub course_id: Uuid,
    /// Chapters in position order
    pub chapters: Vec<SeededChapter>,
}

#[derive(Debug, Clone)]
pub struct SeededChapter {
    pub id: Uuid,
    /// Lessons in position order
    pub lesson_ids: Vec<Uuid>,
}

impl SeededCourse {
    /// Lesson `index` of chapter `chapter`
    pub fn lesson(&self, chapter: usize, index: usize) -> Uuid {
        self.chapters[chapter].lesson_ids[index]
    }

    pub fn chapter(&self, chapter: usize) -> Uuid {
        self.chapters[chapter].id
    }
}

/// Builder for catalog fixtures
#[must_use]
pub struct CourseSeed {
    store: MemoryStore,
    course: Course,
    chapters: Vec<(String, Vec<String>)>,
}

impl CourseSeed {
    pub fn unpublished(mut self) -> Self {
        self.course.is_published = false;
        self
    }

    /// Append a chapter with the given lesson titles, in order
    pub fn chapter(mut self, title: impl Into<String>, lessons: &[&str]) -> Self {
        self.chapters.push((
            title.into(),
            lessons.iter().map(|l| l.to_string()).collect(),
        ));
        self
    }

    pub async fn insert(self) -> SeededCourse {
        let course_id = self.course.id;
        let mut state = self.store.state.lock().await;
        state.courses.push(self.course);

        let mut seeded = Vec::new();
        for (chapter_position, (title, lessons)) in self.chapters.into_iter().enumerate() {
            let chapter = Chapter {
                id: Uuid::new_v4(),
                course_id,
                title,
                position: chapter_position as i32,
            };

            let mut lesson_ids = Vec::new();
            for (position, lesson_title) in lessons.into_iter().enumerate() {
                let version_id = Uuid::new_v4();
                let lesson = LessonRef {
                    id: Uuid::new_v4(),
                    title: lesson_title.clone(),
                    active_version_id: Some(version_id),
                };
                state.placements.push(LessonPlacement {
                    lesson_id: lesson.id,
                    chapter_id: chapter.id,
                    course_id,
                    position: position as i32,
                    lesson_version_id: version_id,
                    lesson_title,
                });
                lesson_ids.push(lesson.id);
                state.lessons.push(lesson);
            }

            seeded.push(SeededChapter {
                id: chapter.id,
                lesson_ids,
            });
            state.chapters.push(chapter);
        }

        tracing::debug!(%course_id, chapters = seeded.len(), "Seeded course");

        SeededCourse {
            course_id,
            chapters: seeded,
        }
    }
}
