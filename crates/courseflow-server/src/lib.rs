//! Courseflow Server Library
//!
//! Course progression and enrollment for a learning platform: students enroll
//! in a course, work through its chapters lesson by lesson, and unlock each
//! lesson by completing the one before it.
//!
//! # Architecture
//!
//! The server follows a **CQRS (Command Query Responsibility Segregation)**
//! architecture:
//!
//! - **Commands** change state inside one store transaction
//!   - Enroll in a course
//!   - Mark a lesson complete
//! - **Queries** read a consistent snapshot and never write
//!   - Enrollment, lesson and course progress
//!   - Next lesson in a chapter (with access gating)
//!   - Course outline
//!
//! Lesson ordering, gating and completion percentages are pure functions in
//! [`sequencing`]. Persistence goes through the [`store::LearningStore`]
//! trait, backed by PostgreSQL in production and by an in-process store in
//! tests and local runs.
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and extractors
//! - **SQLx**: PostgreSQL access and migrations
//! - **Tower**: Middleware and service abstractions
//! - **mediator**: Request dispatch for commands and queries
//!
//! # Example
//!
//! ```no_run
//! use courseflow_server::{api, config::Config, store::MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let state = api::AppState {
//!         store: Arc::new(MemoryStore::new()),
//!         db: None,
//!     };
//!     let app = api::create_router(state, &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod sequencing;
pub mod store;

// Re-export commonly used types
pub use error::{AppError, ServerResult};
