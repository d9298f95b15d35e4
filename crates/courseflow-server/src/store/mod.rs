//! Storage seam for the enrollment ledger and progress tracker
//!
//! Every operation runs against a [`StoreTx`] obtained from
//! [`LearningStore::begin`]. Writes become visible only after
//! [`StoreTx::commit`]; dropping a transaction without committing rolls back
//! everything issued through it, so an early `?` return leaves no partial
//! state behind.
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! let enrollment = tx.find_enrollment(user_id, course_id).await?;
//! // ... reads and writes ...
//! tx.commit().await?;
//! ```
//!
//! Two implementations ship with the server:
//!
//! - [`PgStore`] - PostgreSQL through a `sqlx` pool
//! - [`MemoryStore`] - in-process store used by tests and local runs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ChapterOutline, CourseEnrollment, CourseOutline, LessonRef, NewEnrollment, ProgressUpsert,
    StudentProgress,
};

pub use memory::{CourseSeed, FailPoint, MemoryStore, SeededChapter, SeededCourse};
pub use postgres::PgStore;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Referenced row does not exist
    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure injected through [`MemoryStore::fail_on`]
    #[error("Injected failure at {0:?}")]
    Injected(FailPoint),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Store handle shared by routes and the mediator
pub type SharedStore = Arc<dyn LearningStore>;

/// Entry point: opens transactions
#[async_trait]
pub trait LearningStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// Operations available inside one transaction
#[async_trait]
pub trait StoreTx: Send {
    // Catalog reads

    /// Course with chapters and placements ordered by position
    async fn find_course_with_chapters(
        &mut self,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseOutline>>;

    /// Chapter with placements ordered by position
    async fn find_chapter_with_lessons(
        &mut self,
        chapter_id: Uuid,
    ) -> StoreResult<Option<ChapterOutline>>;

    async fn find_lesson(&mut self, lesson_id: Uuid) -> StoreResult<Option<LessonRef>>;

    /// Number of lesson placements across all chapters of the course
    async fn count_course_lessons(&mut self, course_id: Uuid) -> StoreResult<i64>;

    // Enrollment ledger

    async fn find_enrollment(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseEnrollment>>;

    /// Like [`StoreTx::find_enrollment`], but holds a row lock on the
    /// enrollment until the transaction ends. Writers that recompute
    /// aggregates for the enrollment take this lock first so concurrent
    /// recomputations run one after another.
    async fn lock_enrollment(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseEnrollment>>;

    /// Insert a new enrollment. Fails with [`StoreError::UniqueViolation`] if
    /// the (user, course) pair is already enrolled.
    async fn create_enrollment(&mut self, new: &NewEnrollment) -> StoreResult<CourseEnrollment>;

    /// Record a completion event. `None` leaves the column untouched.
    async fn update_enrollment_on_completion(
        &mut self,
        enrollment_id: Uuid,
        last_completed_id: Option<Uuid>,
        progress_percentage: Option<i32>,
    ) -> StoreResult<CourseEnrollment>;

    // Progress tracker

    async fn find_progress(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> StoreResult<Option<StudentProgress>>;

    /// Create-if-absent, update-if-present on (user, course, lesson)
    async fn upsert_progress(&mut self, upsert: &ProgressUpsert) -> StoreResult<StudentProgress>;

    async fn count_completed_lessons(&mut self, user_id: Uuid, course_id: Uuid)
        -> StoreResult<i64>;

    /// All progress rows of a user in a course, oldest access first
    async fn list_progress(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Vec<StudentProgress>>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
