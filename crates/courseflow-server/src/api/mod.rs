//! HTTP application assembly
//!
//! [`create_router`] mounts the feature routes under `/api/v1` next to the
//! service endpoints (`/` and `/health`) and applies the middleware stack.

pub mod response;

use crate::config::Config;
use crate::db;
use crate::error::ServerResult;
use crate::features;
use crate::middleware;
use crate::store::SharedStore;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use sqlx::PgPool;
use tower_http::compression::CompressionLayer;

/// State shared by the service endpoints
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    /// Present when Postgres backs the store
    pub db: Option<PgPool>,
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    let feature_routes = features::router(features::FeatureState {
        store: state.store.clone(),
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
        .nest("/api/v1", feature_routes)
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Courseflow Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Reports whether the backing store accepts transactions
async fn health(State(state): State<AppState>) -> ServerResult<impl IntoResponse> {
    match &state.db {
        Some(pool) => db::health_check(pool).await?,
        None => {
            // Opening and dropping a transaction leaves no trace
            let _tx = state.store.begin().await?;
        },
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "store": if state.db.is_some() { "postgres" } else { "memory" }
        })),
    ))
}
