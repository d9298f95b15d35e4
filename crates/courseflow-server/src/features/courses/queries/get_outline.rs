use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{validate_id, IdValidationError};
use crate::models::CourseOutline;
use crate::store::{SharedStore, StoreError};

/// Course with chapters and lessons in position order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCourseOutlineQuery {
    pub course_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetCourseOutlineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] IdValidationError),

    #[error("Course '{0}' not found")]
    CourseNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl Request<Result<CourseOutline, GetCourseOutlineError>> for GetCourseOutlineQuery {}

impl crate::cqrs::middleware::Query for GetCourseOutlineQuery {}

impl GetCourseOutlineQuery {
    pub fn validate(&self) -> Result<(), GetCourseOutlineError> {
        validate_id(self.course_id, "course_id")?;
        Ok(())
    }
}

#[tracing::instrument(skip(store), fields(course_id = %query.course_id))]
pub async fn handle(
    store: SharedStore,
    query: GetCourseOutlineQuery,
) -> Result<CourseOutline, GetCourseOutlineError> {
    query.validate()?;

    let mut tx = store.begin().await?;
    let outline = tx
        .find_course_with_chapters(query.course_id)
        .await?
        .ok_or(GetCourseOutlineError::CourseNotFound(query.course_id))?;
    tx.commit().await?;

    tracing::debug!(
        chapters = outline.chapters.len(),
        lessons = outline.lesson_count(),
        "Course outline loaded"
    );

    Ok(outline)
}
