mod config;
mod shutdown;

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use observability::PeakPlayerCount;
use persistence::{LogoutContext, LogoutQueue, LogoutWorker, Shutdown, ShutdownRx};
use player_db::{PlayerDb, PlayerSaver};
use player_state::PlayerAggregate;
use session::{OnlineRegistry, SharedRegistry};
use space::MovementService;

use crate::config::parse_cli_args;
use crate::shutdown::{wait_for_signal, ShutdownSequence};

#[tokio::main]
async fn main() {
    observability::init_logging();

    let config = parse_cli_args();
    tracing::info!("MMO Server starting...");

    let db_config = config.to_database_config();
    match PlayerDb::open(&db_config) {
        Ok(db) => {
            tracing::info!(path = %db_config.path, "Player database ready");
            if let Err(e) = db.close() {
                tracing::warn!("Failed to close bootstrap connection: {}", e);
            }
        }
        Err(e) => {
            tracing::error!("Failed to open player database: {}", e);
            std::process::exit(1);
        }
    }

    let online = OnlineRegistry::shared();
    let movement = Arc::new(MovementService::new());
    let player_count = Arc::new(PeakPlayerCount::new());
    let queue: LogoutQueue<PlayerAggregate> = LogoutQueue::new();

    let context = LogoutContext {
        online: online.clone(),
        movement: movement.clone(),
        player_count: player_count.clone(),
    };
    let worker = LogoutWorker::new(
        queue.clone(),
        PlayerSaver::new(db_config),
        context,
        config.to_worker_config(),
    );
    let shutdown = Shutdown::new();
    let handle = match worker.start(shutdown.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Failed to start logout worker: {}", e);
            std::process::exit(1);
        }
    };

    let mut sequence = ShutdownSequence::new(shutdown.clone(), handle, queue.clone());
    sequence.track(tokio::spawn(report_status(
        config.status.interval_secs,
        online,
        player_count,
        queue,
        shutdown.subscribe(),
    )));

    if let Err(e) = wait_for_signal().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received, stopping server...");
    sequence.run().await;

    tracing::info!("Server stopped.");
}

/// Periodically log online and pending-logout counts until shutdown.
async fn report_status(
    interval_secs: u64,
    online: SharedRegistry,
    player_count: Arc<PeakPlayerCount>,
    queue: LogoutQueue<PlayerAggregate>,
    mut shutdown_rx: ShutdownRx,
) {
    if interval_secs == 0 {
        shutdown_rx.wait().await;
        return;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.tick().await;
    while !shutdown_rx.is_shutdown() {
        tokio::select! {
            _ = shutdown_rx.wait() => break,
            _ = ticker.tick() => {
                let online_now = online.lock().unwrap_or_else(PoisonError::into_inner).count();
                tracing::info!(
                    online = online_now,
                    highest = player_count.highest(),
                    pending_logouts = queue.size(),
                    "server status"
                );
            }
        }
    }
}
