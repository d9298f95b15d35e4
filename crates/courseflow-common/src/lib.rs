//! Courseflow Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the Courseflow workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`CourseflowError`] and the crate-wide [`Result`] alias
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Types**: the caller identity ([`types::Actor`]) handed to every operation
//!
//! # Example
//!
//! ```no_run
//! use courseflow_common::types::Actor;
//!
//! fn caller() -> courseflow_common::Result<Actor> {
//!     Actor::parse("7c9e6679-7425-40de-944b-e07fc1f90ae7", Some("false"))
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CourseflowError, Result};
