//! Course API routes
//!
//! - `GET /api/v1/courses/:course_id/outline` - Chapters and lessons in order

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::store::SharedStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use super::queries::{GetCourseOutlineError, GetCourseOutlineQuery};

pub fn courses_routes() -> Router<SharedStore> {
    Router::new().route("/:course_id/outline", get(get_outline))
}

#[tracing::instrument(skip(store), fields(course_id = %course_id))]
async fn get_outline(
    State(store): State<SharedStore>,
    Path(course_id): Path<Uuid>,
) -> Result<Response, CourseApiError> {
    let response =
        super::queries::get_outline::handle(store, GetCourseOutlineQuery { course_id }).await?;

    let meta = json!({
        "chapter_count": response.chapters.len(),
        "lesson_count": response.lesson_count(),
    });

    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(response, meta))).into_response())
}

#[derive(Debug)]
struct CourseApiError(GetCourseOutlineError);

impl From<GetCourseOutlineError> for CourseApiError {
    fn from(err: GetCourseOutlineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CourseApiError {
    fn into_response(self) -> Response {
        match self.0 {
            GetCourseOutlineError::Validation(_) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.0.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            GetCourseOutlineError::CourseNotFound(_) => {
                let error = ErrorResponse::new("NOT_FOUND", self.0.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            GetCourseOutlineError::Storage(_) => {
                tracing::error!("Storage error during outline retrieval: {}", self.0);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}
