//! Enroll command
//!
//! Enrolls the caller in a course and opens the course's first lesson.
//!
//! # Architecture
//!
//! - Command: pure data (course id plus the caller identity set by the route)
//! - Handler: standalone async function running one store transaction
//! - The (user, course) unique constraint is the final guard against
//!   concurrent enrollments; the pre-check only produces a friendlier error

use chrono::{DateTime, Utc};
use courseflow_common::types::Actor;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{validate_id, IdValidationError};
use crate::models::{NewEnrollment, ProgressUpsert};
use crate::sequencing::first_lesson_of;
use crate::store::{SharedStore, StoreError};

/// Command to enroll the caller in a course
///
/// # Examples
///
/// ```rust,ignore
/// use courseflow_server::features::enrollments::commands::EnrollCommand;
///
/// let command = EnrollCommand {
///     course_id,
///     actor: Some(Actor::student(user_id)),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollCommand {
    pub course_id: Uuid,

    /// Set from the request identity, never from the body
    #[serde(skip)]
    pub actor: Option<Actor>,
}

/// Response from enrolling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub enrollment_id: Uuid,
    pub course_id: Uuid,
    /// Lesson the student should play next
    pub next_lesson_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

/// Errors that can occur when enrolling
#[derive(Debug, thiserror::Error)]
pub enum EnrollError {
    #[error("Authentication is required to enroll")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(#[from] IdValidationError),

    #[error("Course '{0}' not found")]
    CourseNotFound(Uuid),

    #[error("Already enrolled in course '{0}'")]
    AlreadyEnrolled(Uuid),

    #[error("Course '{0}' has no lessons available")]
    NoLessonsAvailable(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl Request<Result<EnrollResponse, EnrollError>> for EnrollCommand {}

impl crate::cqrs::middleware::Command for EnrollCommand {}

impl EnrollCommand {
    /// Validates the command parameters
    #[tracing::instrument(skip(self), fields(course_id = %self.course_id))]
    pub fn validate(&self) -> Result<(), EnrollError> {
        validate_id(self.course_id, "course_id")?;
        Ok(())
    }
}

/// Handler function for enrolling
///
/// Runs in a single transaction:
///
/// 1. Load the course tree
/// 2. Reject if the caller is already enrolled
/// 3. Pick the first lesson of the first non-empty chapter
/// 4. Create the enrollment pointing at that lesson
/// 5. Create the progress row for that lesson, pinned to the placed version
///
/// # Errors
///
/// - `Unauthenticated` if no identity is attached
/// - `CourseNotFound`, `AlreadyEnrolled`, `NoLessonsAvailable` per the steps above
/// - `Storage` if the store fails; nothing is written in that case
#[tracing::instrument(
    skip(store, command),
    fields(
        course_id = %command.course_id,
        user_id = ?command.actor.map(|a| a.id)
    )
)]
pub async fn handle(
    store: SharedStore,
    command: EnrollCommand,
) -> Result<EnrollResponse, EnrollError> {
    let actor = command.actor.ok_or(EnrollError::Unauthenticated)?;
    command.validate()?;

    let course_id = command.course_id;
    let mut tx = store.begin().await?;

    let course = tx
        .find_course_with_chapters(course_id)
        .await?
        .ok_or(EnrollError::CourseNotFound(course_id))?;

    if tx.find_enrollment(actor.id, course_id).await?.is_some() {
        return Err(EnrollError::AlreadyEnrolled(course_id));
    }

    let first = first_lesson_of(&course).ok_or(EnrollError::NoLessonsAvailable(course_id))?;

    let now = Utc::now();
    let enrollment = tx
        .create_enrollment(&NewEnrollment {
            user_id: actor.id,
            course_id,
            current_lesson_id: first.lesson_id,
            enrolled_at: now,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => EnrollError::AlreadyEnrolled(course_id),
            other => EnrollError::Storage(other),
        })?;

    tx.upsert_progress(&ProgressUpsert {
        user_id: actor.id,
        course_id,
        lesson_id: first.lesson_id,
        lesson_version_id: first.lesson_version_id,
        completed: false,
        touched_at: now,
    })
    .await?;

    tx.commit().await?;

    tracing::info!(
        enrollment_id = %enrollment.id,
        next_lesson_id = %first.lesson_id,
        "Student enrolled"
    );

    Ok(EnrollResponse {
        enrollment_id: enrollment.id,
        course_id,
        next_lesson_id: enrollment.current_lesson_id,
        enrolled_at: enrollment.enrolled_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FailPoint, MemoryStore};
    use std::sync::Arc;

    fn stores() -> (MemoryStore, SharedStore) {
        let memory = MemoryStore::new();
        let shared: SharedStore = Arc::new(memory.clone());
        (memory, shared)
    }

    fn command(course_id: Uuid, user_id: Uuid) -> EnrollCommand {
        EnrollCommand {
            course_id,
            actor: Some(Actor::student(user_id)),
        }
    }

    #[test]
    fn test_validation_nil_course() {
        let cmd = command(Uuid::nil(), Uuid::new_v4());
        assert!(matches!(cmd.validate(), Err(EnrollError::Validation(_))));
    }

    #[test]
    fn test_actor_is_not_deserialized() {
        let json = serde_json::json!({
            "course_id": Uuid::new_v4(),
            "actor": { "id": Uuid::new_v4(), "is_admin": true }
        });
        let cmd: EnrollCommand = serde_json::from_value(json).unwrap();
        assert!(cmd.actor.is_none());
    }

    #[tokio::test]
    async fn test_handle_requires_identity() {
        let (_, store) = stores();
        let cmd = EnrollCommand {
            course_id: Uuid::new_v4(),
            actor: None,
        };

        assert!(matches!(handle(store, cmd).await, Err(EnrollError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_handle_enrolls_at_first_non_empty_chapter() {
        let (memory, store) = stores();
        let course = memory
            .seed_course("Rust")
            .chapter("Welcome", &[])
            .chapter("Basics", &["L1", "L2"])
            .insert()
            .await;
        let user = Uuid::new_v4();

        let response = handle(store, command(course.course_id, user)).await.unwrap();
        assert_eq!(response.next_lesson_id, course.lesson(1, 0));

        let enrollments = memory.enrollments().await;
        assert_eq!(enrollments.len(), 1);
        assert_eq!(enrollments[0].user_id, user);
        assert_eq!(enrollments[0].current_lesson_id, course.lesson(1, 0));
        assert_eq!(enrollments[0].progress_percentage, 0);
        assert_eq!(enrollments[0].last_completed_id, None);

        let progress = memory.progress_rows().await;
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].lesson_id, course.lesson(1, 0));
        assert!(!progress[0].completed);
        assert_eq!(progress[0].completed_at, None);
    }

    #[tokio::test]
    async fn test_handle_already_enrolled() {
        let (memory, store) = stores();
        let course = memory.seed_course("Rust").chapter("Basics", &["L1"]).insert().await;
        let user = Uuid::new_v4();

        handle(store.clone(), command(course.course_id, user)).await.unwrap();
        let result = handle(store, command(course.course_id, user)).await;

        assert!(matches!(result, Err(EnrollError::AlreadyEnrolled(id)) if id == course.course_id));
        assert_eq!(memory.enrollments().await.len(), 1);
        assert_eq!(memory.progress_rows().await.len(), 1);
    }

    #[tokio::test]
    async fn test_handle_concurrent_enrollments_single_winner() {
        let (memory, store) = stores();
        let course = memory.seed_course("Rust").chapter("Basics", &["L1"]).insert().await;
        let user = Uuid::new_v4();

        let attempts = (0..8).map(|_| handle(store.clone(), command(course.course_id, user)));
        let results = futures::future::join_all(attempts).await;

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(EnrollError::AlreadyEnrolled(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(memory.enrollments().await.len(), 1);
    }

    #[tokio::test]
    async fn test_handle_no_lessons_available() {
        let (memory, store) = stores();
        let empty = memory
            .seed_course("Empty")
            .chapter("A", &[])
            .chapter("B", &[])
            .insert()
            .await;
        let bare = memory.seed_course("No chapters").insert().await;

        for course_id in [empty.course_id, bare.course_id] {
            let result = handle(store.clone(), command(course_id, Uuid::new_v4())).await;
            assert!(matches!(result, Err(EnrollError::NoLessonsAvailable(_))));
        }

        assert!(memory.enrollments().await.is_empty());
        assert!(memory.progress_rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_handle_course_not_found() {
        let (_, store) = stores();
        let result = handle(store, command(Uuid::new_v4(), Uuid::new_v4())).await;
        assert!(matches!(result, Err(EnrollError::CourseNotFound(_))));
    }

    #[tokio::test]
    async fn test_handle_does_not_check_published_flag() {
        let (memory, store) = stores();
        let course = memory
            .seed_course("Draft")
            .unpublished()
            .chapter("Basics", &["L1"])
            .insert()
            .await;

        assert!(handle(store, command(course.course_id, Uuid::new_v4())).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_rolls_back_when_progress_insert_fails() {
        let (memory, store) = stores();
        let course = memory.seed_course("Rust").chapter("Basics", &["L1"]).insert().await;
        memory.fail_on(FailPoint::UpsertProgress).await;

        let result = handle(store, command(course.course_id, Uuid::new_v4())).await;

        assert!(matches!(result, Err(EnrollError::Storage(StoreError::Injected(_)))));
        assert!(memory.enrollments().await.is_empty());
        assert!(memory.progress_rows().await.is_empty());
    }

    mod postgres {
        use super::*;
        use crate::features::shared::test_helpers::TestCourse;
        use crate::store::PgStore;
        use sqlx::PgPool;

        #[sqlx::test(migrations = "../../migrations")]
        #[ignore] // Requires database
        async fn test_handle_creates_enrollment_and_progress(pool: PgPool) -> sqlx::Result<()> {
            let course = TestCourse::new("Rust")
                .with_chapter("Welcome", &[])
                .with_chapter("Basics", &["L1", "L2"])
                .insert(&pool)
                .await?;
            let store: SharedStore = Arc::new(PgStore::new(pool.clone()));
            let user = Uuid::new_v4();

            let response = handle(store, command(course.course_id, user)).await.unwrap();
            assert_eq!(response.next_lesson_id, course.lesson(1, 0));

            let progress_rows: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM student_progress WHERE user_id = $1 AND course_id = $2",
            )
            .bind(user)
            .bind(course.course_id)
            .fetch_one(&pool)
            .await?;
            assert_eq!(progress_rows, 1);
            Ok(())
        }

        #[sqlx::test(migrations = "../../migrations")]
        #[ignore] // Requires database
        async fn test_handle_concurrent_enrollments_hit_constraint(
            pool: PgPool,
        ) -> sqlx::Result<()> {
            let course = TestCourse::new("Rust")
                .with_chapter("Basics", &["L1"])
                .insert(&pool)
                .await?;
            let store: SharedStore = Arc::new(PgStore::new(pool.clone()));
            let user = Uuid::new_v4();

            let tasks: Vec<_> = (0..6)
                .map(|_| tokio::spawn(handle(store.clone(), command(course.course_id, user))))
                .collect();

            let mut successes = 0;
            for task in tasks {
                match task.await.unwrap() {
                    Ok(_) => successes += 1,
                    Err(EnrollError::AlreadyEnrolled(_)) => {},
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            assert_eq!(successes, 1);

            let enrollments: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM course_enrollments WHERE user_id = $1")
                    .bind(user)
                    .fetch_one(&pool)
                    .await?;
            assert_eq!(enrollments, 1);
            Ok(())
        }
    }
}
