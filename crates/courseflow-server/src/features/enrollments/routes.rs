//! Enrollment API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/enrollments` - Enroll the caller in a course
//! - `GET /api/v1/enrollments/:course_id?user_id=` - Get an enrollment
//!
//! Both routes read the caller from the `x-user-id` / `x-user-is-admin`
//! headers.

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::shared::{ApiJson, CurrentActor};
use crate::store::SharedStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{
    commands::{EnrollCommand, EnrollError},
    queries::{GetEnrollmentError, GetEnrollmentQuery},
};

/// Creates the enrollments router
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api/v1/enrollments", enrollments_routes())
///     .with_state(store);
/// ```
pub fn enrollments_routes() -> Router<SharedStore> {
    Router::new()
        .route("/", post(enroll))
        .route("/:course_id", get(get_enrollment))
}

#[derive(Debug, Deserialize)]
struct UserParams {
    user_id: Option<Uuid>,
}

/// Enroll the caller in a course
///
/// # Endpoint
///
/// `POST /api/v1/enrollments`
///
/// ```json
/// { "course_id": "6f1c..." }
/// ```
///
/// # Response
///
/// - `201 Created` - Enrolled; body carries the next lesson id
/// - `401 Unauthorized` - No caller identity
/// - `404 Not Found` - Course not found
/// - `409 Conflict` - Already enrolled
/// - `422 Unprocessable Entity` - Course has no lessons
#[tracing::instrument(skip(store, actor, command), fields(course_id = %command.course_id))]
async fn enroll(
    State(store): State<SharedStore>,
    CurrentActor(actor): CurrentActor,
    ApiJson(mut command): ApiJson<EnrollCommand>,
) -> Result<Response, EnrollmentApiError> {
    command.actor = actor;

    let response = super::commands::enroll::handle(store, command).await?;

    tracing::info!(
        enrollment_id = %response.enrollment_id,
        "Enrollment created via API"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// Get an enrollment
///
/// # Endpoint
///
/// `GET /api/v1/enrollments/:course_id?user_id=...`
///
/// `user_id` defaults to the caller; other users need the admin flag.
#[tracing::instrument(skip(store, actor, params), fields(course_id = %course_id))]
async fn get_enrollment(
    State(store): State<SharedStore>,
    CurrentActor(actor): CurrentActor,
    Path(course_id): Path<Uuid>,
    Query(params): Query<UserParams>,
) -> Result<Response, EnrollmentApiError> {
    let query = GetEnrollmentQuery {
        course_id,
        user_id: params.user_id,
        actor,
    };

    let response = super::queries::get_enrollment::handle(store, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum EnrollmentApiError {
    Enroll(EnrollError),
    Get(GetEnrollmentError),
}

impl From<EnrollError> for EnrollmentApiError {
    fn from(err: EnrollError) -> Self {
        Self::Enroll(err)
    }
}

impl From<GetEnrollmentError> for EnrollmentApiError {
    fn from(err: GetEnrollmentError) -> Self {
        Self::Get(err)
    }
}

impl IntoResponse for EnrollmentApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Enroll(EnrollError::Unauthenticated)
            | Self::Get(GetEnrollmentError::Unauthenticated) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED")
            },
            Self::Get(GetEnrollmentError::Unauthorized(_)) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Enroll(EnrollError::Validation(_)) | Self::Get(GetEnrollmentError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            Self::Enroll(EnrollError::CourseNotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Enroll(EnrollError::AlreadyEnrolled(_)) => {
                (StatusCode::CONFLICT, "ALREADY_ENROLLED")
            },
            Self::Enroll(EnrollError::NoLessonsAvailable(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_LESSONS_AVAILABLE")
            },
            Self::Enroll(EnrollError::Storage(_)) | Self::Get(GetEnrollmentError::Storage(_)) => {
                tracing::error!("Storage error during enrollment request: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response();
            },
        };

        let error = ErrorResponse::new(code, self.to_string());
        (status, Json(error)).into_response()
    }
}

impl std::fmt::Display for EnrollmentApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enroll(e) => write!(f, "{}", e),
            Self::Get(e) => write!(f, "{}", e),
        }
    }
}
