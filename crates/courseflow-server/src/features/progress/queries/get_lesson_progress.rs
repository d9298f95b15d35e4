use courseflow_common::types::Actor;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{validate_id, validate_optional_id, IdValidationError};
use crate::models::StudentProgress;
use crate::store::{SharedStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLessonProgressQuery {
    pub course_id: Uuid,
    pub lesson_id: Uuid,
    /// Defaults to the caller
    pub user_id: Option<Uuid>,

    #[serde(skip)]
    pub actor: Option<Actor>,
}

/// `progress` is `None` when the user is not enrolled or never opened the lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLessonProgressResponse {
    pub is_enrolled: bool,
    pub progress: Option<StudentProgress>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetLessonProgressError {
    #[error("Authentication is required")]
    Unauthenticated,

    #[error("Not allowed to read progress of user '{0}'")]
    Unauthorized(Uuid),

    #[error("Validation failed: {0}")]
    Validation(#[from] IdValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl Request<Result<GetLessonProgressResponse, GetLessonProgressError>> for GetLessonProgressQuery {}

impl crate::cqrs::middleware::Query for GetLessonProgressQuery {}

impl GetLessonProgressQuery {
    pub fn validate(&self) -> Result<(), GetLessonProgressError> {
        validate_id(self.course_id, "course_id")?;
        validate_id(self.lesson_id, "lesson_id")?;
        validate_optional_id(self.user_id, "user_id")?;
        Ok(())
    }
}

#[tracing::instrument(
    skip(store, query),
    fields(course_id = %query.course_id, lesson_id = %query.lesson_id)
)]
pub async fn handle(
    store: SharedStore,
    query: GetLessonProgressQuery,
) -> Result<GetLessonProgressResponse, GetLessonProgressError> {
    let actor = query.actor.ok_or(GetLessonProgressError::Unauthenticated)?;
    query.validate()?;

    let user_id = actor.target_user(query.user_id);
    if !actor.can_access_user(user_id) {
        return Err(GetLessonProgressError::Unauthorized(user_id));
    }

    let mut tx = store.begin().await?;

    if tx.find_enrollment(user_id, query.course_id).await?.is_none() {
        tracing::debug!(%user_id, "User not enrolled; no lesson progress");
        return Ok(GetLessonProgressResponse {
            is_enrolled: false,
            progress: None,
        });
    }

    let progress = tx.find_progress(user_id, query.course_id, query.lesson_id).await?;
    tx.commit().await?;

    Ok(GetLessonProgressResponse {
        is_enrolled: true,
        progress,
    })
}
