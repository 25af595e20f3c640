//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/estimate", post(estimate_handler))
        .route("/experiments", post(start_experiment_handler).get(list_experiments_handler))
        .route("/experiments/:id/toggle", post(toggle_pause_handler))
        .route("/experiments/:id/reset", post(reset_experiment_handler))
        .route("/experiments/:id", delete(remove_experiment_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
