use courseflow_common::types::Actor;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{validate_id, validate_optional_id, IdValidationError};
use crate::models::CourseEnrollment;
use crate::store::{SharedStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEnrollmentQuery {
    pub course_id: Uuid,
    /// Defaults to the caller
    pub user_id: Option<Uuid>,

    #[serde(skip)]
    pub actor: Option<Actor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEnrollmentResponse {
    pub is_enrolled: bool,
    pub enrollment: Option<CourseEnrollment>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetEnrollmentError {
    #[error("Authentication is required")]
    Unauthenticated,

    #[error("Not allowed to read enrollments of user '{0}'")]
    Unauthorized(Uuid),

    #[error("Validation failed: {0}")]
    Validation(#[from] IdValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl Request<Result<GetEnrollmentResponse, GetEnrollmentError>> for GetEnrollmentQuery {}

impl crate::cqrs::middleware::Query for GetEnrollmentQuery {}

impl GetEnrollmentQuery {
    pub fn validate(&self) -> Result<(), GetEnrollmentError> {
        validate_id(self.course_id, "course_id")?;
        validate_optional_id(self.user_id, "user_id")?;
        Ok(())
    }
}

#[tracing::instrument(skip(store, query), fields(course_id = %query.course_id))]
pub async fn handle(
    store: SharedStore,
    query: GetEnrollmentQuery,
) -> Result<GetEnrollmentResponse, GetEnrollmentError> {
    let actor = query.actor.ok_or(GetEnrollmentError::Unauthenticated)?;
    query.validate()?;

    let user_id = actor.target_user(query.user_id);
    if !actor.can_access_user(user_id) {
        return Err(GetEnrollmentError::Unauthorized(user_id));
    }

    let mut tx = store.begin().await?;
    let enrollment = tx.find_enrollment(user_id, query.course_id).await?;
    tx.commit().await?;

    Ok(GetEnrollmentResponse {
        is_enrolled: enrollment.is_some(),
        enrollment,
    })
}
