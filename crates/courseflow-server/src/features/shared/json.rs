//! JSON body extractor answering failures in the API error envelope
//!
//! `axum::Json` rejects unreadable bodies with a plain-text response. Routes
//! use [`ApiJson`] instead so clients always receive
//! `{ success: false, error: { code, message } }`.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::api::response::ErrorResponse;

/// Deserialized JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(reject(rejection)),
        }
    }
}

fn reject(rejection: JsonRejection) -> Response {
    let code = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "UNSUPPORTED_MEDIA_TYPE",
        _ => "INVALID_BODY",
    };
    tracing::debug!(error = %rejection.body_text(), "Rejected request body");

    (rejection.status(), Json(ErrorResponse::new(code, rejection.body_text()))).into_response()
}
