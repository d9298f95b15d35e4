//! Integration tests for chapter navigation and course outline endpoints

use axum::http::StatusCode;
use uuid::Uuid;

mod helpers;
use helpers::{uuid_at, TestApp};

fn next_lesson_uri(chapter_id: Uuid, current: Option<Uuid>, user: Option<Uuid>) -> String {
    let mut params = Vec::new();
    if let Some(current) = current {
        params.push(format!("current_lesson_id={current}"));
    }
    if let Some(user) = user {
        params.push(format!("user_id={user}"));
    }
    format!("/api/v1/chapters/{chapter_id}/next-lesson?{}", params.join("&"))
}

#[tokio::test]
async fn test_next_lesson_unlocks_after_completion() {
    let app = TestApp::new();
    let course = app
        .store
        .seed_course("Rust")
        .chapter("Basics", &["L1", "L2", "L3"])
        .insert()
        .await;
    let user = Uuid::new_v4();
    app.enroll(user, course.course_id).await;

    let uri = next_lesson_uri(course.chapter(0), Some(course.lesson(0, 0)), Some(user));

    let (status, json) = app.get(&uri, Some(user)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["lesson"].is_null());
    assert_eq!(json["data"]["is_last_in_chapter"], false);

    app.complete(user, course.course_id, course.lesson(0, 0)).await;

    let (_, json) = app.get(&uri, Some(user)).await;
    assert_eq!(uuid_at(&json["data"]["lesson"]["lesson_id"]), course.lesson(0, 1));
    assert_eq!(json["data"]["lesson"]["lesson_title"], "L2");
    assert_eq!(json["data"]["is_last_in_chapter"], false);
}

#[tokio::test]
async fn test_next_lesson_end_of_chapter() {
    let app = TestApp::new();
    let course = app.store.seed_course("Rust").chapter("Basics", &["L1", "L2"]).insert().await;
    let user = Uuid::new_v4();

    let uri = next_lesson_uri(course.chapter(0), Some(course.lesson(0, 1)), None);
    let (status, json) = app.get(&uri, Some(user)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["lesson"].is_null());
    assert_eq!(json["data"]["is_last_in_chapter"], true);
}

#[tokio::test]
async fn test_next_lesson_without_current_starts_at_top() {
    let app = TestApp::new();
    let course = app.store.seed_course("Rust").chapter("Basics", &["Only"]).insert().await;
    let user = Uuid::new_v4();
    app.enroll(user, course.course_id).await;

    let uri = next_lesson_uri(course.chapter(0), None, Some(user));
    let (_, json) = app.get(&uri, Some(user)).await;

    assert_eq!(uuid_at(&json["data"]["lesson"]["lesson_id"]), course.lesson(0, 0));
    assert_eq!(json["data"]["is_last_in_chapter"], true);
}

#[tokio::test]
async fn test_next_lesson_requires_identity() {
    let app = TestApp::new();
    let course = app.store.seed_course("Rust").chapter("Basics", &["L1"]).insert().await;

    let (status, _) = app.get(&next_lesson_uri(course.chapter(0), None, None), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_next_lesson_unknown_chapter() {
    let app = TestApp::new();
    let (status, json) = app
        .get(&next_lesson_uri(Uuid::new_v4(), None, None), Some(Uuid::new_v4()))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_next_lesson_for_other_user_is_forbidden() {
    let app = TestApp::new();
    let course = app.store.seed_course("Rust").chapter("Basics", &["L1"]).insert().await;

    let uri = next_lesson_uri(course.chapter(0), None, Some(Uuid::new_v4()));
    let (status, json) = app.get(&uri, Some(Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_course_outline() {
    let app = TestApp::new();
    let course = app
        .store
        .seed_course("Rust")
        .chapter("Intro", &[])
        .chapter("Basics", &["Ownership", "Borrowing"])
        .insert()
        .await;

    let (status, json) = app
        .get(&format!("/api/v1/courses/{}/outline", course.course_id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Rust");
    assert_eq!(json["data"]["chapters"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["data"]["chapters"][1]["lessons"][1]["lesson_title"], "Borrowing");
    assert_eq!(json["meta"]["lesson_count"], 2);
}

#[tokio::test]
async fn test_course_outline_not_found() {
    let app = TestApp::new();
    let (status, _) = app
        .get(&format!("/api/v1/courses/{}/outline", Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_root() {
    let app = TestApp::new();

    let (status, json) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["store"], "memory");

    let (status, json) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Courseflow Server");
}
