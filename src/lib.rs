//! Volum - A state-managed HTTP server for tracking timed fill and drain
//! experiments
//!
//! This library computes how long a fill or drain operation takes for a given
//! volume and flow rate, and tracks any number of such operations with
//! pause/resume/reset, anchored to wall-clock timestamps and persisted to a
//! local file store.

pub mod config;
pub mod duration;
pub mod state;
pub mod store;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, Experiment, ExperimentTracker};
pub use store::{StateStore, EXPERIMENTS_KEY};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
