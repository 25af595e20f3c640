//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::{format_duration, format_duration_lines};
use crate::state::Experiment;

/// Request body for the estimate and start endpoints: total volume in
/// liters, volume flowing per interval in milliliters, interval length in
/// seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRequest {
    pub volume_liters: f64,
    pub flow_volume_ml: f64,
    pub interval_seconds: f64,
}

impl ExperimentRequest {
    /// Effective depletion rate in milliliters per second
    pub fn ml_per_sec(&self) -> f64 {
        self.flow_volume_ml / self.interval_seconds
    }
}

/// One experiment as exposed to clients, with quantities derived as of the
/// moment the response was built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentView {
    pub id: String,
    pub start_liters: f64,
    pub ml_per_sec: f64,
    pub remaining_ml: f64,
    pub remaining_liters: f64,
    pub remaining_seconds: f64,
    pub remaining_label: String,
    pub is_running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl ExperimentView {
    /// Build the client-facing view of an experiment as of `now`
    pub fn from_experiment(experiment: &Experiment, now: DateTime<Utc>) -> Self {
        let remaining_ml = experiment.remaining_at(now);
        let remaining_seconds = remaining_ml / experiment.ml_per_sec;

        Self {
            id: experiment.id.clone(),
            start_liters: experiment.start_liters,
            ml_per_sec: experiment.ml_per_sec,
            remaining_ml,
            remaining_liters: remaining_ml / 1000.0,
            remaining_seconds,
            remaining_label: format_duration(remaining_seconds),
            is_running: experiment.is_running,
            started_at: experiment.started_at,
            ends_at: experiment.ends_at,
        }
    }

    pub fn from_experiments(experiments: &[Experiment], now: DateTime<Utc>) -> Vec<Self> {
        experiments
            .iter()
            .map(|e| Self::from_experiment(e, now))
            .collect()
    }
}

/// API response structure for experiment mutation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub experiments: Vec<ExperimentView>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, experiments: Vec<ExperimentView>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            experiments,
        }
    }

    /// Create a success response
    pub fn ok(message: String, experiments: Vec<ExperimentView>) -> Self {
        Self::new("ok".to_string(), message, experiments)
    }
}

/// Response for the pure duration estimate endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub total_seconds: f64,
    pub formatted: String,
    pub day_line: String,
    pub time_line: String,
    /// Projected end time if the operation started now; absent for an empty
    /// volume
    pub ends_at: Option<DateTime<Utc>>,
}

impl EstimateResponse {
    pub fn from_estimate(total_seconds: f64, volume_liters: f64, now: DateTime<Utc>) -> Self {
        let [day_line, time_line] = format_duration_lines(total_seconds);
        let ends_at = (volume_liters > 0.0)
            .then(|| now + chrono::Duration::milliseconds((total_seconds * 1000.0) as i64));

        Self {
            total_seconds,
            formatted: format_duration(total_seconds),
            day_line,
            time_line,
            ends_at,
        }
    }
}

/// Status response with tracker and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub experiment_count: usize,
    pub running_count: usize,
    pub tick_interval_ms: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: "1.0.0".to_string(),
        }
    }
}
