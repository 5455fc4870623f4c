//! Rankr Server Library
//!
//! HTTP server for bulk user import and user lookup.
//!
//! # Overview
//!
//! - **API Endpoints**: streamed user import and user lookup under `/api/v1`
//! - **Storage**: PostgreSQL through the `rankr-import` repository port
//! - **Configuration**: environment-based configuration management
//! - **Middleware**: CORS, request tracing, and import body limits
//!
//! # Architecture
//!
//! Features are vertical slices under [`features`], split into commands
//! (write operations) and queries (read operations). All of them share one
//! [`UserService`](rankr_import::UserService) and a shutdown token that
//! cancels imports still running when the server stops.

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::config::Config;
use crate::features::FeatureState;

// Re-export commonly used types
pub use error::AppError;

/// Build the application router with all routes and middleware
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let feature_routes = features::router(state.clone(), config.import.max_body_bytes);

    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
        .nest("/api/v1", feature_routes)
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler
async fn health_check(State(state): State<FeatureState>) -> Result<impl IntoResponse, AppError> {
    state.users.repository().health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}
