//! Chapter API routes
//!
//! - `GET /api/v1/chapters/:chapter_id/next-lesson?current_lesson_id=&user_id=`

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::shared::CurrentActor;
use crate::store::SharedStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::queries::{GetChapterNextLessonError, GetChapterNextLessonQuery};

pub fn chapters_routes() -> Router<SharedStore> {
    Router::new().route("/:chapter_id/next-lesson", get(next_lesson))
}

#[derive(Debug, Deserialize)]
struct NextLessonParams {
    current_lesson_id: Option<Uuid>,
    user_id: Option<Uuid>,
}

/// Next lesson after `current_lesson_id` in a chapter
///
/// # Response
///
/// - `200 OK` - `{ "lesson": {...} | null, "is_last_in_chapter": bool }`
/// - `401 Unauthorized` - No caller identity
/// - `403 Forbidden` - `user_id` names another user and caller is not admin
/// - `404 Not Found` - Chapter not found
#[tracing::instrument(skip(store, actor, params), fields(chapter_id = %chapter_id))]
async fn next_lesson(
    State(store): State<SharedStore>,
    CurrentActor(actor): CurrentActor,
    Path(chapter_id): Path<Uuid>,
    Query(params): Query<NextLessonParams>,
) -> Result<Response, ChapterApiError> {
    let query = GetChapterNextLessonQuery {
        chapter_id,
        current_lesson_id: params.current_lesson_id,
        user_id: params.user_id,
        actor,
    };

    let response = super::queries::next_lesson::handle(store, query).await?;

    tracing::debug!(
        has_lesson = response.lesson.is_some(),
        is_last_in_chapter = response.is_last_in_chapter,
        "Next lesson computed via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug)]
struct ChapterApiError(GetChapterNextLessonError);

impl From<GetChapterNextLessonError> for ChapterApiError {
    fn from(err: GetChapterNextLessonError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ChapterApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            GetChapterNextLessonError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED")
            },
            GetChapterNextLessonError::Unauthorized(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            GetChapterNextLessonError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            GetChapterNextLessonError::ChapterNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            GetChapterNextLessonError::Storage(_) => {
                tracing::error!("Storage error during next lesson lookup: {}", self.0);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response();
            },
        };

        let error = ErrorResponse::new(code, self.0.to_string());
        (status, Json(error)).into_response()
    }
}
