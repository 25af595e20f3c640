//! Signal handling for graceful shutdown

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use futures::stream::StreamExt;
use tracing::info;

/// Wait for a shutdown signal (SIGTERM or SIGINT)
pub async fn shutdown_signal() {
    let mut signals = Signals::new([SIGTERM, SIGINT])
        .expect("Failed to create signal handler");

    if let Some(signal) = signals.next().await {
        let name = match signal {
            SIGTERM => "SIGTERM",
            SIGINT => "SIGINT",
            _ => "signal",
        };
        info!("Received {}", name);
    }
}
