//! Caller identity extraction
//!
//! Authentication happens upstream. The gateway forwards the user id in
//! `x-user-id` and the admin flag in `x-user-is-admin`; both are trusted as
//! given. A request without `x-user-id` yields `CurrentActor(None)` and the
//! operation itself decides whether identity is required.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use courseflow_common::{types::Actor, CourseflowError};
use serde_json::json;

use crate::api::response::ErrorResponse;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const IS_ADMIN_HEADER: &str = "x-user-is-admin";

/// Identity of the caller, if the gateway supplied one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentActor(pub Option<Actor>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(user_id) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Self(None));
        };

        let user_id = user_id
            .to_str()
            .map_err(|_| invalid_identity(USER_ID_HEADER, "header is not valid text"))?;
        let is_admin = parts
            .headers
            .get(IS_ADMIN_HEADER)
            .map(|v| v.to_str())
            .transpose()
            .map_err(|_| invalid_identity(IS_ADMIN_HEADER, "header is not valid text"))?;

        let actor = Actor::parse(user_id, is_admin).map_err(|e| {
            let header = match e {
                CourseflowError::InvalidUserId(_) => USER_ID_HEADER,
                CourseflowError::InvalidAdminFlag(_) => IS_ADMIN_HEADER,
            };
            invalid_identity(header, e.to_string())
        })?;

        tracing::trace!(actor = %actor, "Resolved caller identity");
        Ok(Self(Some(actor)))
    }
}

fn invalid_identity(header: &'static str, message: impl Into<String>) -> Response {
    let error =
        ErrorResponse::with_details("INVALID_IDENTITY", message, json!({ "header": header }));
    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    async fn extract(request: Request<()>) -> Result<CurrentActor, Response> {
        let (mut parts, _) = request.into_parts();
        CurrentActor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await.unwrap(), CurrentActor(None));
    }

    #[tokio::test]
    async fn test_admin_header() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .header(USER_ID_HEADER, id.to_string())
            .header(IS_ADMIN_HEADER, "true")
            .body(())
            .unwrap();

        assert_eq!(extract(request).await.unwrap(), CurrentActor(Some(Actor::admin(id))));
    }

    #[tokio::test]
    async fn test_malformed_user_id_is_rejected() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "student-42")
            .body(())
            .unwrap();

        let response = extract(request).await.unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
