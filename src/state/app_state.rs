//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use crate::store::{StateStore, EXPERIMENTS_KEY};

use super::{Experiment, ExperimentTracker};

/// Main application state owning the experiment tracker and its persistence
#[derive(Debug)]
pub struct AppState {
    /// The tracked experiments; the single mutable collection of the process
    pub tracker: Arc<Mutex<ExperimentTracker>>,
    /// Backing key-value store, written best-effort after every mutation
    pub store: StateStore,
    /// Tick cadence for the background recomputation task
    pub tick_interval_ms: u64,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Running-entry count, published after every mutation so the tick task
    /// can park itself while nothing is counting down
    pub tracker_update_tx: watch::Sender<usize>,
    /// Keep the receiver alive to prevent channel closure
    pub _tracker_update_rx: watch::Receiver<usize>,
}

impl AppState {
    /// Create a new AppState around an already-restored tracker
    pub fn new(
        tracker: ExperimentTracker,
        store: StateStore,
        port: u16,
        host: String,
        tick_interval_ms: u64,
    ) -> Self {
        let running = tracker.running_count();
        let (tracker_update_tx, tracker_update_rx) = watch::channel(running);

        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            store,
            tick_interval_ms,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            tracker_update_tx,
            _tracker_update_rx: tracker_update_rx,
        }
    }

    /// Apply a mutation to the tracker, then record the action, persist the
    /// new snapshot best-effort and publish the running count.
    pub fn update_tracker<F, R>(&self, action: &str, updater: F) -> Result<R, String>
    where
        F: FnOnce(&mut ExperimentTracker, DateTime<Utc>) -> R,
    {
        let now = Utc::now();
        let (result, snapshot, running) = {
            let mut tracker = self.tracker.lock()
                .map_err(|e| format!("Failed to lock tracker: {}", e))?;
            let result = updater(&mut tracker, now);
            (result, tracker.serialize(), tracker.running_count())
        };

        // Update last action tracking
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(now);
        }

        self.persist(snapshot);

        if let Err(e) = self.tracker_update_tx.send(running) {
            warn!("Failed to publish tracker update: {}", e);
        }

        Ok(result)
    }

    /// Start a new experiment. `ml_per_sec` must already be validated > 0.
    pub fn start_experiment(&self, start_liters: f64, ml_per_sec: f64) -> Result<Experiment, String> {
        self.update_tracker("start", |tracker, now| {
            tracker.start(start_liters, ml_per_sec, now)
        })
    }

    /// Pause or resume an experiment. `Ok(None)` when the id is unknown.
    pub fn toggle_pause(&self, id: &str) -> Result<Option<Experiment>, String> {
        self.update_tracker("toggle-pause", |tracker, now| {
            tracker.toggle_pause(id, now).cloned()
        })
    }

    /// Reset an experiment to its full starting quantity.
    pub fn reset_experiment(&self, id: &str) -> Result<Option<Experiment>, String> {
        self.update_tracker("reset", |tracker, _| tracker.reset(id).cloned())
    }

    /// Remove an experiment; removing an unknown id is not an error.
    pub fn remove_experiment(&self, id: &str) -> Result<bool, String> {
        self.update_tracker("remove", |tracker, _| tracker.remove(id))
    }

    /// Recompute all running experiments from their end timestamps.
    ///
    /// Persists and publishes only when something actually changed; a tick
    /// does not count as a user action.
    pub fn apply_tick(&self, now: DateTime<Utc>) -> Result<bool, String> {
        let (changed, snapshot, running) = {
            let mut tracker = self.tracker.lock()
                .map_err(|e| format!("Failed to lock tracker: {}", e))?;
            let changed = tracker.tick(now);
            let snapshot = changed.then(|| tracker.serialize());
            (changed, snapshot, tracker.running_count())
        };

        if let Some(snapshot) = snapshot {
            self.persist(snapshot);
            if let Err(e) = self.tracker_update_tx.send(running) {
                warn!("Failed to publish tracker update: {}", e);
            }
        }

        Ok(changed)
    }

    /// Clone the current entry list for rendering
    pub fn snapshot(&self) -> Result<Vec<Experiment>, String> {
        self.tracker.lock()
            .map(|tracker| tracker.experiments().to_vec())
            .map_err(|e| format!("Failed to lock tracker: {}", e))
    }

    /// Number of experiments currently counting down
    pub fn running_count(&self) -> Result<usize, String> {
        self.tracker.lock()
            .map(|tracker| tracker.running_count())
            .map_err(|e| format!("Failed to lock tracker: {}", e))
    }

    /// Total number of tracked experiments
    pub fn experiment_count(&self) -> Result<usize, String> {
        self.tracker.lock()
            .map(|tracker| tracker.len())
            .map_err(|e| format!("Failed to lock tracker: {}", e))
    }

    /// Write the current tracker contents to the store, best-effort
    pub fn persist_now(&self) {
        let snapshot = match self.tracker.lock() {
            Ok(tracker) => tracker.serialize(),
            Err(e) => {
                warn!("Failed to lock tracker for persistence: {}", e);
                return;
            }
        };
        self.persist(snapshot);
    }

    fn persist(&self, snapshot: Result<String, serde_json::Error>) {
        match snapshot {
            Ok(raw) => {
                if let Err(e) = self.store.write(EXPERIMENTS_KEY, &raw) {
                    warn!("Failed to persist experiments: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize experiments: {}", e),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
