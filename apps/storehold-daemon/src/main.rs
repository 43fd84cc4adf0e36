//! # Storehold Daemon
//!
//! Hosts the engine's background workers.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. tracing-subscriber with RUST_LOG                                    │
//! │  2. EngineConfig::load_or_default(--config)                             │
//! │  3. Engine::open (creates the data dir, runs migrations)                │
//! │  4. spawn ReceiptWorker and ExpirySweeper                               │
//! │  5. wait for Ctrl-C / SIGTERM                                           │
//! │  6. stop both workers, wait for them, close the pool                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```text
//! storehold-daemon [--config <PATH>]
//! RUST_LOG=storehold=trace storehold-daemon
//! ```

use std::env;
use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use storehold_engine::{Engine, EngineConfig, ExpirySweeper, ReceiptQueue, ReceiptWorker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(config_path) = parse_args() else {
        return Ok(());
    };

    init_tracing();
    let config = EngineConfig::load_or_default(config_path);

    info!(
        db = %config.database.path.display(),
        expiry_hours = config.orders.expiry_hours,
        sweep_interval_secs = config.orders.sweep_interval_secs,
        "Starting Storehold daemon"
    );

    let (queue, jobs) = ReceiptQueue::channel(config.receipts.queue_capacity);
    let engine = Engine::open(config).await?.with_receipt_queue(queue);
    if !engine.db().health_check().await {
        warn!("Database health check failed, continuing");
    }

    let (receipt_worker, receipt_handle) = ReceiptWorker::new(engine.clone(), jobs);
    let (sweeper, sweeper_handle) = ExpirySweeper::new(engine.clone());

    let receipt_task = tokio::spawn(receipt_worker.run());
    let sweeper_task = tokio::spawn(sweeper.run());

    shutdown_signal().await;

    sweeper_handle.shutdown().await;
    receipt_handle.shutdown().await;

    for (name, task) in [("expiry sweeper", sweeper_task), ("receipt worker", receipt_task)] {
        if let Err(e) = task.await {
            error!(worker = name, error = %e, "Worker task ended abnormally");
        }
    }

    engine.db().close().await;
    info!("Storehold daemon stopped");
    Ok(())
}

/// Returns the `--config` path, or `None` when only help was requested.
fn parse_args() -> Option<Option<PathBuf>> {
    let args: Vec<String> = env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storehold Daemon");
                println!();
                println!("Usage: storehold-daemon [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return None;
            }
            _ => {}
        }
        i += 1;
    }

    Some(config_path)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storehold=trace` - Show trace for storehold crates only
/// - Default: INFO, DEBUG for storehold, WARN for sqlx
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storehold=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping workers");
}
