//! Next lesson in a chapter
//!
//! Computes the lesson after `current_lesson_id` and, when a `user_id` is
//! given, applies access gating: a lesson after the first one is only
//! returned once the current lesson is completed. A gated or not-enrolled
//! result is `{ lesson: null, is_last_in_chapter: false }`, never an error.
//!
//! Read-only; runs in one transaction for a consistent snapshot.

use courseflow_common::types::Actor;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{validate_id, validate_optional_id, IdValidationError};
use crate::sequencing::{is_access_allowed, next_lesson_in_chapter, NextLesson};
use crate::store::{SharedStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetChapterNextLessonQuery {
    pub chapter_id: Uuid,
    /// Absent: start at the top of the chapter
    pub current_lesson_id: Option<Uuid>,
    /// Absent: no enrollment or gating checks
    pub user_id: Option<Uuid>,

    #[serde(skip)]
    pub actor: Option<Actor>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetChapterNextLessonError {
    #[error("Authentication is required")]
    Unauthenticated,

    #[error("Not allowed to read progress of user '{0}'")]
    Unauthorized(Uuid),

    #[error("Validation failed: {0}")]
    Validation(#[from] IdValidationError),

    #[error("Chapter '{0}' not found")]
    ChapterNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl Request<Result<NextLesson, GetChapterNextLessonError>> for GetChapterNextLessonQuery {}

impl crate::cqrs::middleware::Query for GetChapterNextLessonQuery {}

impl GetChapterNextLessonQuery {
    pub fn validate(&self) -> Result<(), GetChapterNextLessonError> {
        validate_id(self.chapter_id, "chapter_id")?;
        validate_optional_id(self.current_lesson_id, "current_lesson_id")?;
        validate_optional_id(self.user_id, "user_id")?;
        Ok(())
    }
}

#[tracing::instrument(
    skip(store, query),
    fields(
        chapter_id = %query.chapter_id,
        current_lesson_id = ?query.current_lesson_id,
        user_id = ?query.user_id
    )
)]
pub async fn handle(
    store: SharedStore,
    query: GetChapterNextLessonQuery,
) -> Result<NextLesson, GetChapterNextLessonError> {
    let actor = query.actor.ok_or(GetChapterNextLessonError::Unauthenticated)?;
    query.validate()?;

    if let Some(user_id) = query.user_id {
        if !actor.can_access_user(user_id) {
            return Err(GetChapterNextLessonError::Unauthorized(user_id));
        }
    }

    let mut tx = store.begin().await?;

    let chapter = tx
        .find_chapter_with_lessons(query.chapter_id)
        .await?
        .ok_or(GetChapterNextLessonError::ChapterNotFound(query.chapter_id))?;

    let step = next_lesson_in_chapter(&chapter, query.current_lesson_id);

    if let (Some(user_id), Some(target_index)) = (query.user_id, step.target_index()) {
        if tx.find_enrollment(user_id, chapter.course_id).await?.is_none() {
            tracing::debug!(%user_id, "User not enrolled; next lesson hidden");
            return Ok(NextLesson::none(false));
        }

        let current_progress = match query.current_lesson_id {
            Some(lesson_id) => tx.find_progress(user_id, chapter.course_id, lesson_id).await?,
            None => None,
        };

        if !is_access_allowed(target_index, current_progress.as_ref()) {
            tracing::debug!(%user_id, target_index, "Next lesson gated on current completion");
            return Ok(NextLesson::none(false));
        }
    }

    let next = NextLesson::from(step);
    tx.commit().await?;

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::enrollments::commands::{enroll, EnrollCommand};
    use crate::features::progress::commands::{mark_lesson_complete, MarkLessonCompleteCommand};
    use crate::store::{MemoryStore, SeededCourse};
    use std::sync::Arc;

    async fn setup(lessons: &[&str]) -> (MemoryStore, SharedStore, SeededCourse) {
        let memory = MemoryStore::new();
        let store: SharedStore = Arc::new(memory.clone());
        let course = memory.seed_course("Rust").chapter("Basics", lessons).insert().await;
        (memory, store, course)
    }

    async fn enroll_user(store: &SharedStore, course: &SeededCourse, user: Uuid) {
        enroll::handle(
            store.clone(),
            EnrollCommand {
                course_id: course.course_id,
                actor: Some(Actor::student(user)),
            },
        )
        .await
        .unwrap();
    }

    fn query(course: &SeededCourse, current: Option<Uuid>, user: Uuid) -> GetChapterNextLessonQuery {
        GetChapterNextLessonQuery {
            chapter_id: course.chapter(0),
            current_lesson_id: current,
            user_id: Some(user),
            actor: Some(Actor::student(user)),
        }
    }

    #[tokio::test]
    async fn test_handle_gated_until_current_completed() {
        let (_, store, course) = setup(&["L1", "L2", "L3"]).await;
        let user = Uuid::new_v4();
        enroll_user(&store, &course, user).await;

        let gated = handle(store.clone(), query(&course, Some(course.lesson(0, 0)), user))
            .await
            .unwrap();
        assert_eq!(gated, NextLesson::none(false));

        mark_lesson_complete::handle(
            store.clone(),
            MarkLessonCompleteCommand {
                course_id: course.course_id,
                lesson_id: course.lesson(0, 0),
                completed: true,
                actor: Some(Actor::student(user)),
            },
        )
        .await
        .unwrap();

        let open = handle(store, query(&course, Some(course.lesson(0, 0)), user))
            .await
            .unwrap();
        assert_eq!(open.lesson.map(|l| l.lesson_id), Some(course.lesson(0, 1)));
        assert!(!open.is_last_in_chapter);
    }

    #[tokio::test]
    async fn test_handle_first_lesson_always_open() {
        let (_, store, course) = setup(&["L1", "L2"]).await;
        let user = Uuid::new_v4();
        enroll_user(&store, &course, user).await;

        let next = handle(store, query(&course, None, user)).await.unwrap();
        assert_eq!(next.lesson.map(|l| l.lesson_id), Some(course.lesson(0, 0)));
        assert!(!next.is_last_in_chapter);
    }

    #[tokio::test]
    async fn test_handle_not_enrolled_hides_lesson() {
        let (_, store, course) = setup(&["L1", "L2"]).await;
        let next = handle(store, query(&course, None, Uuid::new_v4())).await.unwrap();
        assert_eq!(next, NextLesson::none(false));
    }

    #[tokio::test]
    async fn test_handle_without_user_skips_gating() {
        let (_, store, course) = setup(&["L1", "L2"]).await;
        let next = handle(
            store,
            GetChapterNextLessonQuery {
                user_id: None,
                ..query(&course, Some(course.lesson(0, 0)), Uuid::new_v4())
            },
        )
        .await
        .unwrap();

        assert_eq!(next.lesson.map(|l| l.lesson_id), Some(course.lesson(0, 1)));
        assert!(next.is_last_in_chapter);
    }

    #[tokio::test]
    async fn test_handle_end_of_chapter_and_unknown_lesson() {
        let (_, store, course) = setup(&["L1", "L2"]).await;
        let user = Uuid::new_v4();
        enroll_user(&store, &course, user).await;

        let end = handle(store.clone(), query(&course, Some(course.lesson(0, 1)), user))
            .await
            .unwrap();
        assert_eq!(end, NextLesson::none(true));

        let unknown = handle(store, query(&course, Some(Uuid::new_v4()), user)).await.unwrap();
        assert_eq!(unknown, NextLesson::none(false));
    }

    #[tokio::test]
    async fn test_handle_chapter_not_found() {
        let (_, store, _) = setup(&["L1"]).await;
        let user = Uuid::new_v4();
        let result = handle(
            store,
            GetChapterNextLessonQuery {
                chapter_id: Uuid::new_v4(),
                current_lesson_id: None,
                user_id: None,
                actor: Some(Actor::student(user)),
            },
        )
        .await;

        assert!(matches!(result, Err(GetChapterNextLessonError::ChapterNotFound(_))));
    }

    #[tokio::test]
    async fn test_handle_other_user_requires_admin() {
        let (_, store, course) = setup(&["L1", "L2"]).await;
        let student = Uuid::new_v4();
        enroll_user(&store, &course, student).await;

        let as_other = GetChapterNextLessonQuery {
            actor: Some(Actor::student(Uuid::new_v4())),
            ..query(&course, None, student)
        };
        assert!(matches!(
            handle(store.clone(), as_other).await,
            Err(GetChapterNextLessonError::Unauthorized(_))
        ));

        let as_admin = GetChapterNextLessonQuery {
            actor: Some(Actor::admin(Uuid::new_v4())),
            ..query(&course, None, student)
        };
        let next = handle(store, as_admin).await.unwrap();
        assert_eq!(next.lesson.map(|l| l.lesson_id), Some(course.lesson(0, 0)));
    }

    #[tokio::test]
    async fn test_handle_never_writes() {
        let (memory, store, course) = setup(&["L1", "L2"]).await;
        let user = Uuid::new_v4();
        enroll_user(&store, &course, user).await;
        let before = memory.progress_rows().await;

        handle(store, query(&course, Some(course.lesson(0, 0)), user)).await.unwrap();

        assert_eq!(memory.progress_rows().await, before);
    }

    mod postgres {
        use super::*;
        use crate::features::shared::test_helpers::TestCourse;
        use crate::store::PgStore;
        use sqlx::PgPool;

        #[sqlx::test(migrations = "../../migrations")]
        #[ignore] // Requires database
        async fn test_handle_gating_against_postgres(pool: PgPool) -> sqlx::Result<()> {
            let course = TestCourse::new("Rust")
                .with_chapter("Basics", &["L1", "L2"])
                .insert(&pool)
                .await?;
            let store: SharedStore = Arc::new(PgStore::new(pool.clone()));
            let user = Uuid::new_v4();

            enroll::handle(
                store.clone(),
                EnrollCommand {
                    course_id: course.course_id,
                    actor: Some(Actor::student(user)),
                },
            )
            .await
            .unwrap();

            let q = GetChapterNextLessonQuery {
                chapter_id: course.chapter(0),
                current_lesson_id: Some(course.lesson(0, 0)),
                user_id: Some(user),
                actor: Some(Actor::student(user)),
            };

            let gated = handle(store.clone(), q.clone()).await.unwrap();
            assert!(gated.lesson.is_none());

            sqlx::query("UPDATE student_progress SET completed = TRUE WHERE user_id = $1")
                .bind(user)
                .execute(&pool)
                .await?;

            let open = handle(store, q).await.unwrap();
            assert_eq!(open.lesson.map(|l| l.lesson_id), Some(course.lesson(0, 1)));
            assert!(open.is_last_in_chapter);
            Ok(())
        }
    }
}
