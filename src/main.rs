//! Volum - A state-managed HTTP server for tracking timed fill and drain
//! experiments
//!
//! This is the main entry point for the volum application.

use std::sync::Arc;
use chrono::Utc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use volum::{
    config::Config,
    state::{AppState, ExperimentTracker},
    store::{StateStore, EXPERIMENTS_KEY},
    api::create_router,
    tasks::tracker_tick_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("volum={},tower_http=info", config.log_level()))
        .init();

    info!("Starting volum server v1.0.0");
    info!("Configuration: host={}, port={}, tick={}ms, state_dir={}",
          config.host, config.port, config.tick_ms, config.state_dir);

    // Restore persisted experiments; a missing or unreadable store means an
    // empty collection, never a startup failure
    let store = StateStore::new(&config.state_dir);
    let tracker = restore_tracker(&store);
    if !tracker.is_empty() {
        info!("Restored {} experiment(s), {} running",
              tracker.len(), tracker.running_count());
    }

    // Create application state
    let state = Arc::new(AppState::new(
        tracker,
        store,
        config.port,
        config.host.clone(),
        config.tick_ms,
    ));

    // Entries reconciled at load time must land back in the store
    state.persist_now();

    // Start the tick background task
    let tick_state = Arc::clone(&state);
    tokio::spawn(async move {
        tracker_tick_task(tick_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /estimate                 - Compute a duration estimate");
    info!("  POST   /experiments              - Start a new experiment");
    info!("  GET    /experiments              - List tracked experiments");
    info!("  POST   /experiments/:id/toggle   - Pause or resume an experiment");
    info!("  POST   /experiments/:id/reset    - Reset an experiment");
    info!("  DELETE /experiments/:id          - Remove an experiment");
    info!("  GET    /status                   - Tracker and server status");
    info!("  GET    /health                   - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // One last best-effort write so nothing mutated since the previous
    // persist is lost
    state.persist_now();

    info!("Server shutdown complete");
    Ok(())
}

/// Load the persisted experiment list and reconcile running entries against
/// the current wall-clock time. Any failure is logged and yields an empty
/// tracker.
fn restore_tracker(store: &StateStore) -> ExperimentTracker {
    match store.read(EXPERIMENTS_KEY) {
        Ok(Some(raw)) => match ExperimentTracker::deserialize(&raw, Utc::now()) {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!("Failed to parse stored experiments, starting empty: {}", e);
                ExperimentTracker::new()
            }
        },
        Ok(None) => ExperimentTracker::new(),
        Err(e) => {
            warn!("Failed to read experiment store, starting empty: {}", e);
            ExperimentTracker::new()
        }
    }
}
