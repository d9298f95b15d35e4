use courseflow_common::types::Actor;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{validate_id, validate_optional_id, IdValidationError};
use crate::models::{CourseEnrollment, StudentProgress};
use crate::store::{SharedStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCourseProgressQuery {
    pub course_id: Uuid,
    /// Defaults to the caller
    pub user_id: Option<Uuid>,

    #[serde(skip)]
    pub actor: Option<Actor>,
}

/// Enrollment summary with every progress row of the course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCourseProgressResponse {
    pub enrollment: CourseEnrollment,
    /// Oldest access first
    pub lessons: Vec<StudentProgress>,
    pub completed_lessons: i64,
    pub total_lessons: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetCourseProgressError {
    #[error("Authentication is required")]
    Unauthenticated,

    #[error("Not allowed to read progress of user '{0}'")]
    Unauthorized(Uuid),

    #[error("Validation failed: {0}")]
    Validation(#[from] IdValidationError),

    #[error("Not enrolled in course '{0}'")]
    NotEnrolled(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl Request<Result<GetCourseProgressResponse, GetCourseProgressError>> for GetCourseProgressQuery {}

impl crate::cqrs::middleware::Query for GetCourseProgressQuery {}

impl GetCourseProgressQuery {
    pub fn validate(&self) -> Result<(), GetCourseProgressError> {
        validate_id(self.course_id, "course_id")?;
        validate_optional_id(self.user_id, "user_id")?;
        Ok(())
    }
}

#[tracing::instrument(skip(store, query), fields(course_id = %query.course_id))]
pub async fn handle(
    store: SharedStore,
    query: GetCourseProgressQuery,
) -> Result<GetCourseProgressResponse, GetCourseProgressError> {
    let actor = query.actor.ok_or(GetCourseProgressError::Unauthenticated)?;
    query.validate()?;

    let user_id = actor.target_user(query.user_id);
    if !actor.can_access_user(user_id) {
        return Err(GetCourseProgressError::Unauthorized(user_id));
    }

    let mut tx = store.begin().await?;

    let enrollment = tx
        .find_enrollment(user_id, query.course_id)
        .await?
        .ok_or(GetCourseProgressError::NotEnrolled(query.course_id))?;

    let lessons = tx.list_progress(user_id, query.course_id).await?;
    let total_lessons = tx.count_course_lessons(query.course_id).await?;
    tx.commit().await?;

    let completed_lessons = lessons.iter().filter(|p| p.completed).count() as i64;

    Ok(GetCourseProgressResponse {
        enrollment,
        lessons,
        completed_lessons,
        total_lessons,
    })
}
