//! Progress API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/progress/complete` - Record a lesson touch or completion
//! - `GET /api/v1/progress/:course_id?user_id=` - Course progress summary
//! - `GET /api/v1/progress/:course_id/lessons/:lesson_id?user_id=` - One lesson

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
    commands::{MarkLessonCompleteCommand, MarkLessonCompleteError},
    queries::{
        GetCourseProgressError, GetCourseProgressQuery, GetLessonProgressError,
        GetLessonProgressQuery,
    },
};

pub fn progress_routes() -> Router<SharedStore> {
    Router::new()
        .route("/complete", post(mark_lesson_complete))
        .route("/:course_id", get(get_course_progress))
        .route("/:course_id/lessons/:lesson_id", get(get_lesson_progress))
}

#[derive(Debug, Deserialize)]
struct UserParams {
    user_id: Option<Uuid>,
}

/// Record progress on a lesson
///
/// # Endpoint
///
/// `POST /api/v1/progress/complete`
///
/// ```json
/// { "course_id": "...", "lesson_id": "...", "completed": true }
/// ```
///
/// # Response
///
/// - `200 OK` - Progress row and the new course percentage
/// - `401 Unauthorized` - No caller identity
/// - `403 Forbidden` - Caller is not enrolled in the course
/// - `404 Not Found` - Lesson not found
#[tracing::instrument(
    skip(store, actor, command),
    fields(course_id = %command.course_id, lesson_id = %command.lesson_id)
)]
async fn mark_lesson_complete(
    State(store): State<SharedStore>,
    CurrentActor(actor): CurrentActor,
    ApiJson(mut command): ApiJson<MarkLessonCompleteCommand>,
) -> Result<Response, ProgressApiError> {
    command.actor = actor;

    let response = super::commands::mark_lesson_complete::handle(store, command).await?;

    tracing::info!(
        progress_id = %response.progress.id,
        progress_percentage = response.progress_percentage,
        "Lesson progress recorded via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Course progress summary
///
/// # Endpoint
///
/// `GET /api/v1/progress/:course_id?user_id=...`
///
/// # Response
///
/// - `200 OK` - Enrollment, progress rows and lesson counts
/// - `403 Forbidden` - Not enrolled, or another user's progress without admin
#[tracing::instrument(skip(store, actor, params), fields(course_id = %course_id))]
async fn get_course_progress(
    State(store): State<SharedStore>,
    CurrentActor(actor): CurrentActor,
    Path(course_id): Path<Uuid>,
    Query(params): Query<UserParams>,
) -> Result<Response, ProgressApiError> {
    let query = GetCourseProgressQuery {
        course_id,
        user_id: params.user_id,
        actor,
    };

    let response = super::queries::get_course_progress::handle(store, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Progress row of one lesson
///
/// # Endpoint
///
/// `GET /api/v1/progress/:course_id/lessons/:lesson_id?user_id=...`
#[tracing::instrument(
    skip(store, actor, params),
    fields(course_id = %course_id, lesson_id = %lesson_id)
)]
async fn get_lesson_progress(
    State(store): State<SharedStore>,
    CurrentActor(actor): CurrentActor,
    Path((course_id, lesson_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<UserParams>,
) -> Result<Response, ProgressApiError> {
    let query = GetLessonProgressQuery {
        course_id,
        lesson_id,
        user_id: params.user_id,
        actor,
    };

    let response = super::queries::get_lesson_progress::handle(store, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum ProgressApiError {
    Mark(MarkLessonCompleteError),
    Course(GetCourseProgressError),
    Lesson(GetLessonProgressError),
}

impl From<MarkLessonCompleteError> for ProgressApiError {
    fn from(err: MarkLessonCompleteError) -> Self {
        Self::Mark(err)
    }
}

impl From<GetCourseProgressError> for ProgressApiError {
    fn from(err: GetCourseProgressError) -> Self {
        Self::Course(err)
    }
}

impl From<GetLessonProgressError> for ProgressApiError {
    fn from(err: GetLessonProgressError) -> Self {
        Self::Lesson(err)
    }
}

impl IntoResponse for ProgressApiError {
    fn into_response(self) -> Response {
        use GetCourseProgressError as Course;
        use GetLessonProgressError as Lesson;
        use MarkLessonCompleteError as Mark;

        let (status, code) = match &self {
            Self::Mark(Mark::Unauthenticated)
            | Self::Course(Course::Unauthenticated)
            | Self::Lesson(Lesson::Unauthenticated) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            Self::Course(Course::Unauthorized(_)) | Self::Lesson(Lesson::Unauthorized(_)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN")
            },
            Self::Mark(Mark::NotEnrolled(_)) | Self::Course(Course::NotEnrolled(_)) => {
                (StatusCode::FORBIDDEN, "NOT_ENROLLED")
            },
            Self::Mark(Mark::Validation(_))
            | Self::Course(Course::Validation(_))
            | Self::Lesson(Lesson::Validation(_)) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Mark(Mark::LessonNotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Mark(Mark::Storage(_))
            | Self::Course(Course::Storage(_))
            | Self::Lesson(Lesson::Storage(_)) => {
                tracing::error!("Storage error during progress request: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response();
            },
        };

        let error = ErrorResponse::new(code, self.to_string());
        (status, Json(error)).into_response()
    }
}

impl std::fmt::Display for ProgressApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mark(e) => write!(f, "{}", e),
            Self::Course(e) => write!(f, "{}", e),
            Self::Lesson(e) => write!(f, "{}", e),
        }
    }
}
