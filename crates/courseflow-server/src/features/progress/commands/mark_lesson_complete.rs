//! Mark lesson complete command
//!
//! Records a lesson touch for the caller. With `completed = true` the
//! lesson is marked done, the enrollment remembers it as the last completed
//! lesson and the course percentage is recomputed from fresh counts.
//!
//! Completion is monotonic: `completed = false` on a finished lesson only
//! refreshes `last_accessed`.

use courseflow_common::types::Actor;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{validate_id, IdValidationError};
use crate::models::{ProgressUpsert, StudentProgress};
use crate::sequencing::completion_percentage;
use crate::store::{SharedStore, StoreError};

/// Command to record progress on a lesson
///
/// # Examples
///
/// ```rust,ignore
/// let command = MarkLessonCompleteCommand {
///     course_id,
///     lesson_id,
///     completed: true,
///     actor: Some(Actor::student(user_id)),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkLessonCompleteCommand {
    pub course_id: Uuid,
    pub lesson_id: Uuid,
    #[serde(default = "default_completed")]
    pub completed: bool,

    #[serde(skip)]
    pub actor: Option<Actor>,
}

fn default_completed() -> bool {
    true
}

/// Response: the progress row after the write plus the enrollment percentage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkLessonCompleteResponse {
    #[serde(flatten)]
    pub progress: StudentProgress,
    pub progress_percentage: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum MarkLessonCompleteError {
    #[error("Authentication is required to record progress")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(#[from] IdValidationError),

    #[error("Not enrolled in course '{0}'")]
    NotEnrolled(Uuid),

    #[error("Lesson '{0}' not found")]
    LessonNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl Request<Result<MarkLessonCompleteResponse, MarkLessonCompleteError>>
    for MarkLessonCompleteCommand
{
}

impl crate::cqrs::middleware::Command for MarkLessonCompleteCommand {}

impl MarkLessonCompleteCommand {
    pub fn validate(&self) -> Result<(), MarkLessonCompleteError> {
        validate_id(self.course_id, "course_id")?;
        validate_id(self.lesson_id, "lesson_id")?;
        Ok(())
    }
}

/// Handler function for recording lesson progress
///
/// Runs in a single transaction; if any step fails nothing is written.
///
/// # Errors
///
/// - `Unauthenticated` / `Validation` before any store access
/// - `NotEnrolled` if the caller has no enrollment in the course
/// - `LessonNotFound` if the lesson is missing or has no active version
/// - `Storage` on store failures
#[tracing::instrument(
    skip(store, command),
    fields(
        course_id = %command.course_id,
        lesson_id = %command.lesson_id,
        completed = command.completed
    )
)]
pub async fn handle(
    store: SharedStore,
    command: MarkLessonCompleteCommand,
) -> Result<MarkLessonCompleteResponse, MarkLessonCompleteError> {
    let actor = command.actor.ok_or(MarkLessonCompleteError::Unauthenticated)?;
    command.validate()?;

    let mut tx = store.begin().await?;

    // Serializes completions for this enrollment so the count below sees
    // every earlier committed completion
    let enrollment = tx
        .lock_enrollment(actor.id, command.course_id)
        .await?
        .ok_or(MarkLessonCompleteError::NotEnrolled(command.course_id))?;

    let version_id = tx
        .find_lesson(command.lesson_id)
        .await?
        .and_then(|lesson| lesson.active_version_id)
        .ok_or(MarkLessonCompleteError::LessonNotFound(command.lesson_id))?;

    let progress = tx
        .upsert_progress(&ProgressUpsert {
            user_id: actor.id,
            course_id: command.course_id,
            lesson_id: command.lesson_id,
            lesson_version_id: version_id,
            completed: command.completed,
            touched_at: chrono::Utc::now(),
        })
        .await?;

    let last_completed_id = command.completed.then_some(command.lesson_id);

    let total = tx.count_course_lessons(command.course_id).await?;
    let percentage = if total > 0 {
        let completed = tx.count_completed_lessons(actor.id, command.course_id).await?;
        completion_percentage(completed, total)
    } else {
        None
    };

    let progress_percentage = if last_completed_id.is_some() || percentage.is_some() {
        tx.update_enrollment_on_completion(enrollment.id, last_completed_id, percentage)
            .await?
            .progress_percentage
    } else {
        enrollment.progress_percentage
    };

    tx.commit().await?;

    tracing::info!(
        enrollment_id = %enrollment.id,
        progress_percentage,
        "Lesson progress recorded"
    );

    Ok(MarkLessonCompleteResponse {
        progress,
        progress_percentage,
    })
}
