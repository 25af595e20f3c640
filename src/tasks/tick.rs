//! Periodic recomputation background task

use std::{sync::Arc, time::Duration};
use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Background task that periodically recomputes all running experiments from
/// their absolute end timestamps.
///
/// The cadence only affects how fresh persisted values are, never
/// correctness: every pass rederives remaining quantities from wall-clock
/// time, so missed or delayed passes are self-correcting. While no
/// experiment is running the task parks on the tracker update channel
/// instead of polling.
pub async fn tracker_tick_task(state: Arc<AppState>) {
    info!("Starting experiment tick task");

    let mut update_rx = state.tracker_update_tx.subscribe();
    let tick_interval = Duration::from_millis(state.tick_interval_ms);

    loop {
        let running = match state.running_count() {
            Ok(n) => n,
            Err(e) => {
                error!("Failed to read running count: {}", e);
                sleep(tick_interval).await;
                continue;
            }
        };

        if running == 0 {
            debug!("No running experiments, tick task parked");
            if update_rx.changed().await.is_err() {
                info!("Tracker update channel closed, stopping tick task");
                return;
            }
            continue;
        }

        sleep(tick_interval).await;

        match state.apply_tick(Utc::now()) {
            Ok(true) => debug!("Tick updated running experiments"),
            Ok(false) => {}
            Err(e) => error!("Tick failed: {}", e),
        }
    }
}
