//! Feature modules implementing the Courseflow API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes, following the CQRS (Command Query Responsibility Segregation)
//! pattern.
//!
//! # Features
//!
//! - **enrollments**: enroll in a course, read an enrollment
//! - **progress**: record lesson completion, read lesson and course progress
//! - **chapters**: next lesson in a chapter with access gating
//! - **courses**: course outline
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//!
//! Commands and queries implement the mediator pattern using the `mediator`
//! crate; handlers take the shared store and run one store transaction each.

pub mod chapters;
pub mod courses;
pub mod enrollments;
pub mod progress;
pub mod shared;

use axum::Router;

use crate::store::SharedStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Enrollment ledger and progress tracker
    pub store: SharedStore,
}

/// Creates the main API router with all feature routes mounted
///
/// - `/courses` - Course outlines
/// - `/enrollments` - Enrollment
/// - `/progress` - Lesson progress
/// - `/chapters` - Chapter navigation
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/courses", courses::courses_routes().with_state(state.store.clone()))
        .nest("/enrollments", enrollments::enrollments_routes().with_state(state.store.clone()))
        .nest("/progress", progress::progress_routes().with_state(state.store.clone()))
        .nest("/chapters", chapters::chapters_routes().with_state(state.store.clone()))
}
