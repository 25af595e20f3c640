//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{duration::estimate_total_seconds, state::AppState};
use super::responses::{
    ApiResponse, EstimateResponse, ExperimentRequest, ExperimentView, HealthResponse,
    StatusResponse,
};

/// Validate a request's numbers, returning the estimated total duration in
/// seconds. Rejections never construct an entry.
fn validate_request(request: &ExperimentRequest) -> Result<f64, StatusCode> {
    match estimate_total_seconds(
        request.volume_liters,
        request.flow_volume_ml,
        request.interval_seconds,
    ) {
        Some(total_seconds) => Ok(total_seconds),
        None => {
            warn!(
                "Rejected request with invalid parameters: volume={} flow={} interval={}",
                request.volume_liters, request.flow_volume_ml, request.interval_seconds
            );
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
    }
}

/// Handle POST /estimate - Compute a duration estimate without starting anything
pub async fn estimate_handler(
    Json(request): Json<ExperimentRequest>,
) -> Result<Json<EstimateResponse>, StatusCode> {
    let total_seconds = validate_request(&request)?;
    Ok(Json(EstimateResponse::from_estimate(
        total_seconds,
        request.volume_liters,
        Utc::now(),
    )))
}

/// Handle POST /experiments - Start tracking a new experiment
pub async fn start_experiment_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExperimentRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    validate_request(&request)?;
    if request.volume_liters <= 0.0 {
        warn!("Rejected experiment start with empty volume");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let ml_per_sec = request.ml_per_sec();
    match state.start_experiment(request.volume_liters, ml_per_sec) {
        Ok(experiment) => {
            info!(
                "Started experiment {} ({} L at {} ml/s)",
                experiment.id, experiment.start_liters, experiment.ml_per_sec
            );
            respond_with_snapshot(&state, format!("Experiment {} started", experiment.id))
        }
        Err(e) => {
            error!("Failed to start experiment: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /experiments - Read-only snapshot of the tracked experiments
pub async fn list_experiments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    respond_with_snapshot(&state, "Current experiments".to_string())
}

/// Handle POST /experiments/:id/toggle - Pause or resume an experiment
pub async fn toggle_pause_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.toggle_pause(&id) {
        Ok(Some(experiment)) => {
            let verb = if experiment.is_running { "resumed" } else { "paused" };
            info!("Experiment {} {}", experiment.id, verb);
            respond_with_snapshot(&state, format!("Experiment {} {}", experiment.id, verb))
        }
        Ok(None) => {
            warn!("Toggle requested for unknown experiment {}", id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            error!("Failed to toggle experiment {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /experiments/:id/reset - Restore the full starting quantity
pub async fn reset_experiment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reset_experiment(&id) {
        Ok(Some(experiment)) => {
            info!("Experiment {} reset", experiment.id);
            respond_with_snapshot(&state, format!("Experiment {} reset", experiment.id))
        }
        Ok(None) => {
            warn!("Reset requested for unknown experiment {}", id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            error!("Failed to reset experiment {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle DELETE /experiments/:id - Remove an experiment (idempotent)
pub async fn remove_experiment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.remove_experiment(&id) {
        Ok(removed) => {
            let message = if removed {
                info!("Experiment {} removed", id);
                format!("Experiment {} removed", id)
            } else {
                format!("Experiment {} was not tracked", id)
            };
            respond_with_snapshot(&state, message)
        }
        Err(e) => {
            error!("Failed to remove experiment {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return tracker counters and server information
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let experiment_count = match state.experiment_count() {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to read experiment count: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let running_count = match state.running_count() {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to read running count: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        experiment_count,
        running_count,
        tick_interval_ms: state.tick_interval_ms,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn respond_with_snapshot(
    state: &Arc<AppState>,
    message: String,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.snapshot() {
        Ok(experiments) => {
            let views = ExperimentView::from_experiments(&experiments, Utc::now());
            Ok(Json(ApiResponse::ok(message, views)))
        }
        Err(e) => {
            error!("Failed to read experiment snapshot: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
