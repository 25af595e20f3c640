//! Ordered collection of experiments and its countdown bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Experiment;

/// Ordered list of tracked experiments, newest first.
///
/// All time-dependent operations take the current instant explicitly so the
/// logic stays deterministic under test; callers pass `Utc::now()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentTracker {
    experiments: Vec<Experiment>,
}

impl ExperimentTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new experiment and prepend it to the list.
    ///
    /// Callers must have validated `ml_per_sec > 0` beforehand.
    pub fn start(&mut self, start_liters: f64, ml_per_sec: f64, now: DateTime<Utc>) -> Experiment {
        let experiment = Experiment::new(start_liters, ml_per_sec, now);
        self.experiments.insert(0, experiment.clone());
        experiment
    }

    /// Pause a running experiment or resume a paused one. Returns the entry
    /// after the transition, or `None` when the id is unknown.
    pub fn toggle_pause(&mut self, id: &str, now: DateTime<Utc>) -> Option<&Experiment> {
        let experiment = self.experiments.iter_mut().find(|e| e.id == id)?;
        if experiment.is_running {
            experiment.pause(now);
        } else {
            experiment.resume(now);
        }
        Some(experiment)
    }

    /// Restore an experiment to its full starting quantity, stopped.
    pub fn reset(&mut self, id: &str) -> Option<&Experiment> {
        let experiment = self.experiments.iter_mut().find(|e| e.id == id)?;
        experiment.reset();
        Some(experiment)
    }

    /// Remove an experiment. Returns whether one was actually deleted;
    /// removing an unknown id is not an error.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.experiments.len();
        self.experiments.retain(|e| e.id != id);
        self.experiments.len() != before
    }

    /// Recompute every running experiment from its absolute end timestamp.
    ///
    /// Each entry is recomputed independently from `now`, so the pass is
    /// idempotent for a fixed instant and safe under missed or irregular
    /// invocations. Returns whether any entry changed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        for experiment in &mut self.experiments {
            changed |= experiment.reconcile(now);
        }
        changed
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn find(&self, id: &str) -> Option<&Experiment> {
        self.experiments.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Number of experiments currently counting down.
    pub fn running_count(&self) -> usize {
        self.experiments.iter().filter(|e| e.is_running).count()
    }

    /// Serialize the entry list as a JSON document.
    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.experiments)
    }

    /// Restore a tracker from a serialized document, reconciling running
    /// entries against `now` so that time elapsed while nothing was ticking
    /// (typically while the process was down) is reflected immediately.
    pub fn deserialize(raw: &str, now: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        let experiments: Vec<Experiment> = serde_json::from_str(raw)?;
        let mut tracker = Self { experiments };
        tracker.tick(now);
        Ok(tracker)
    }
}
