//! PostgreSQL implementation of the learning store

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{LearningStore, StoreError, StoreResult, StoreTx};
use crate::features::shared::error_helpers::is_unique_violation;
use crate::models::{
    Chapter, ChapterOutline, Course, CourseEnrollment, CourseOutline, LessonPlacement, LessonRef,
    NewEnrollment, ProgressUpsert, StudentProgress,
};

const ENROLLMENT_COLUMNS: &str = "id, user_id, course_id, enrolled_at, current_lesson_id, \
     last_completed_id, progress_percentage";

const PROGRESS_COLUMNS: &str = "id, user_id, course_id, lesson_id, lesson_version_id, completed, \
     completed_at, last_accessed, time_spent";

const PLACEMENT_SELECT: &str = r#"
    SELECT lp.lesson_id, lp.chapter_id, lp.course_id, lp.position,
           lp.lesson_version_id, l.title AS lesson_title
    FROM lesson_placements lp
    JOIN lessons l ON l.id = lp.lesson_id
"#;

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LearningStore for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_course_with_chapters(
        &mut self,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseOutline>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, short_description, image_url, is_published
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(course) = course else {
            return Ok(None);
        };

        let chapters = sqlx::query_as::<_, Chapter>(
            r#"
            SELECT id, course_id, title, position
            FROM chapters
            WHERE course_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(&mut *self.tx)
        .await?;

        let placements = sqlx::query_as::<_, LessonPlacement>(&format!(
            "{PLACEMENT_SELECT} WHERE lp.course_id = $1 ORDER BY lp.position ASC"
        ))
        .bind(course_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(Some(CourseOutline::assemble(course, chapters, placements)))
    }

    async fn find_chapter_with_lessons(
        &mut self,
        chapter_id: Uuid,
    ) -> StoreResult<Option<ChapterOutline>> {
        let chapter = sqlx::query_as::<_, Chapter>(
            "SELECT id, course_id, title, position FROM chapters WHERE id = $1",
        )
        .bind(chapter_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(chapter) = chapter else {
            return Ok(None);
        };

        let lessons = sqlx::query_as::<_, LessonPlacement>(&format!(
            "{PLACEMENT_SELECT} WHERE lp.chapter_id = $1 ORDER BY lp.position ASC"
        ))
        .bind(chapter_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(Some(ChapterOutline::assemble(chapter, lessons)))
    }

    async fn find_lesson(&mut self, lesson_id: Uuid) -> StoreResult<Option<LessonRef>> {
        let lesson = sqlx::query_as::<_, LessonRef>(
            "SELECT id, title, active_version_id FROM lessons WHERE id = $1",
        )
        .bind(lesson_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(lesson)
    }

    async fn count_course_lessons(&mut self, course_id: Uuid) -> StoreResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lesson_placements WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(count)
    }

    async fn find_enrollment(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseEnrollment>> {
        let enrollment = sqlx::query_as::<_, CourseEnrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM course_enrollments \
             WHERE user_id = $1 AND course_id = $2"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(enrollment)
    }

    async fn lock_enrollment(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<CourseEnrollment>> {
        let enrollment = sqlx::query_as::<_, CourseEnrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM course_enrollments \
             WHERE user_id = $1 AND course_id = $2 \
             FOR UPDATE"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(enrollment)
    }

    async fn create_enrollment(&mut self, new: &NewEnrollment) -> StoreResult<CourseEnrollment> {
        sqlx::query_as::<_, CourseEnrollment>(&format!(
            "INSERT INTO course_enrollments \
                 (user_id, course_id, enrolled_at, current_lesson_id, progress_percentage) \
             VALUES ($1, $2, $3, $4, 0) \
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(new.course_id)
        .bind(new.enrolled_at)
        .bind(new.current_lesson_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::UniqueViolation(format!(
                    "enrollment for user {} in course {}",
                    new.user_id, new.course_id
                ))
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn update_enrollment_on_completion(
        &mut self,
        enrollment_id: Uuid,
        last_completed_id: Option<Uuid>,
        progress_percentage: Option<i32>,
    ) -> StoreResult<CourseEnrollment> {
        let enrollment = sqlx::query_as::<_, CourseEnrollment>(&format!(
            "UPDATE course_enrollments SET \
                 last_completed_id = COALESCE($2, last_completed_id), \
                 progress_percentage = COALESCE($3, progress_percentage) \
             WHERE id = $1 \
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(enrollment_id)
        .bind(last_completed_id)
        .bind(progress_percentage)
        .fetch_optional(&mut *self.tx)
        .await?;

        enrollment.ok_or_else(|| StoreError::RowNotFound(format!("enrollment {enrollment_id}")))
    }

    async fn find_progress(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> StoreResult<Option<StudentProgress>> {
        let progress = sqlx::query_as::<_, StudentProgress>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM student_progress \
             WHERE user_id = $1 AND course_id = $2 AND lesson_id = $3"
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(lesson_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(progress)
    }

    async fn upsert_progress(&mut self, upsert: &ProgressUpsert) -> StoreResult<StudentProgress> {
        // Single statement keyed on the unique triple; concurrent touches of
        // the same lesson serialise on the conflicting row.
        let progress = sqlx::query_as::<_, StudentProgress>(&format!(
            r#"
            INSERT INTO student_progress
                (user_id, course_id, lesson_id, lesson_version_id,
                 completed, completed_at, last_accessed)
            VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN $6 ELSE NULL END, $6)
            ON CONFLICT (user_id, course_id, lesson_id) DO UPDATE SET
                completed = student_progress.completed OR EXCLUDED.completed,
                completed_at = CASE
                    WHEN EXCLUDED.completed THEN EXCLUDED.completed_at
                    ELSE student_progress.completed_at
                END,
                last_accessed = EXCLUDED.last_accessed
            RETURNING {PROGRESS_COLUMNS}
            "#
        ))
        .bind(upsert.user_id)
        .bind(upsert.course_id)
        .bind(upsert.lesson_id)
        .bind(upsert.lesson_version_id)
        .bind(upsert.completed)
        .bind(upsert.touched_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(progress)
    }

    async fn count_completed_lessons(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM student_progress
            WHERE user_id = $1 AND course_id = $2 AND completed = TRUE
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn list_progress(
        &mut self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Vec<StudentProgress>> {
        let rows = sqlx::query_as::<_, StudentProgress>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM student_progress \
             WHERE user_id = $1 AND course_id = $2 \
             ORDER BY last_accessed ASC"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
