//! Experiment entry structure and per-entry countdown transitions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One tracked fill/drain operation.
///
/// While running, the authoritative remaining quantity is derived from
/// `ends_at` against the current wall-clock time; `remaining_ml` is only
/// authoritative when the entry is paused. `started_at` and `ends_at` are
/// both set exactly when `is_running` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub start_liters: f64,
    pub ml_per_sec: f64,
    pub remaining_ml: f64,
    pub is_running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl Experiment {
    /// Create a new running experiment anchored at `now`.
    ///
    /// Callers must have validated `ml_per_sec > 0` beforehand.
    pub fn new(start_liters: f64, ml_per_sec: f64, now: DateTime<Utc>) -> Self {
        let remaining_ml = start_liters * 1000.0;
        Self {
            id: generate_id(now),
            start_liters,
            ml_per_sec,
            remaining_ml,
            is_running: true,
            started_at: Some(now),
            ends_at: Some(now + duration_for(remaining_ml, ml_per_sec)),
        }
    }

    /// Remaining quantity in milliliters as of `now`.
    ///
    /// Derived from `ends_at` while running, taken from `remaining_ml` at
    /// rest.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> f64 {
        match (self.is_running, self.ends_at) {
            (true, Some(ends_at)) => {
                let remaining_ms = (ends_at - now).num_milliseconds().max(0);
                remaining_ms as f64 / 1000.0 * self.ml_per_sec
            }
            _ => self.remaining_ml,
        }
    }

    /// Freeze the countdown, storing the quantity derived from `ends_at`.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if !self.is_running {
            return;
        }
        self.remaining_ml = self.remaining_at(now);
        self.is_running = false;
        self.started_at = None;
        self.ends_at = None;
    }

    /// Resume the countdown, re-anchoring both timestamps from the stored
    /// remaining quantity.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.is_running {
            return;
        }
        self.is_running = true;
        self.started_at = Some(now);
        self.ends_at = Some(now + duration_for(self.remaining_ml, self.ml_per_sec));
    }

    /// Restore the full starting quantity and stop the countdown.
    pub fn reset(&mut self) {
        self.remaining_ml = self.start_liters * 1000.0;
        self.is_running = false;
        self.started_at = None;
        self.ends_at = None;
    }

    /// Recompute the remaining quantity from `ends_at` as of `now`,
    /// transitioning to completed when it reaches zero. Returns whether the
    /// entry changed. Entries that are paused or lack an end timestamp are
    /// left untouched.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> bool {
        let Some(ends_at) = self.ends_at else {
            return false;
        };
        if !self.is_running {
            return false;
        }

        let remaining_ms = (ends_at - now).num_milliseconds().max(0);
        let remaining_ml = remaining_ms as f64 / 1000.0 * self.ml_per_sec;
        if remaining_ml <= 0.0 {
            let changed = self.remaining_ml != 0.0 || self.is_running;
            self.remaining_ml = 0.0;
            self.is_running = false;
            self.started_at = None;
            self.ends_at = None;
            changed
        } else {
            let changed = self.remaining_ml != remaining_ml;
            self.remaining_ml = remaining_ml;
            changed
        }
    }
}

/// Unique entry id: creation timestamp plus a short random suffix.
fn generate_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::random::<u32>() & 0xff_ffff;
    format!("{}-{:06x}", now.timestamp_millis(), suffix)
}

fn duration_for(remaining_ml: f64, ml_per_sec: f64) -> Duration {
    Duration::milliseconds((remaining_ml / ml_per_sec * 1000.0) as i64)
}
