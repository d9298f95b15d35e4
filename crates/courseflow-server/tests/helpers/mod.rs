//! Test helpers for Courseflow server integration tests
//!
//! Builds the full router over an in-process store so HTTP tests run
//! without a database server, plus small request/response helpers.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use courseflow_server::{
    api::{self, AppState},
    config::Config,
    store::MemoryStore,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Router plus a handle on its store for seeding and inspection
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

impl TestApp {
    pub fn new() -> Self {
        init_tracing();

        let store = MemoryStore::new();
        let state = AppState {
            store: Arc::new(store.clone()),
            db: None,
        };
        let router = api::create_router(state, &Config::default());

        Self { router, store }
    }

    /// Send a request and decode the JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("body is not JSON")
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: Option<Uuid>) -> (StatusCode, Value) {
        self.send(get_request(uri, user)).await
    }

    pub async fn post(&self, uri: &str, user: Option<Uuid>, body: Value) -> (StatusCode, Value) {
        self.send(post_request(uri, user, body)).await
    }

    /// Enroll `user` in `course_id`, asserting success
    pub async fn enroll(&self, user: Uuid, course_id: Uuid) -> Value {
        let (status, json) = self
            .post("/api/v1/enrollments", Some(user), serde_json::json!({ "course_id": course_id }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "enroll failed: {json}");
        json
    }

    /// Mark a lesson complete for `user`, asserting success
    pub async fn complete(&self, user: Uuid, course_id: Uuid, lesson_id: Uuid) -> Value {
        let (status, json) = self
            .post(
                "/api/v1/progress/complete",
                Some(user),
                serde_json::json!({ "course_id": course_id, "lesson_id": lesson_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "complete failed: {json}");
        json
    }
}

pub fn get_request(uri: &str, user: Option<Uuid>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    builder.body(Body::empty()).expect("valid request")
}

pub fn post_request(uri: &str, user: Option<Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    builder.body(Body::from(body.to_string())).expect("valid request")
}

/// Parse a JSON string field as a UUID
pub fn uuid_at(value: &Value) -> Uuid {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("expected a UUID, got {value}"))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("courseflow_server=debug")
        .with_test_writer()
        .try_init();
}
