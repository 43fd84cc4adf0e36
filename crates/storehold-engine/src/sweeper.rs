//! # Expiry Sweeper
//!
//! Cancels website orders left unpaid past the expiry window and releases
//! their reservations.
//!
//! ## Sweep
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Expiry Sweep                                     │
//! │                                                                         │
//! │  every sweep_interval_secs (default 300):                               │
//! │                                                                         │
//! │    cutoff = now − expiry_hours (default 24)                             │
//! │                                                                         │
//! │    SELECT id FROM orders                                                │
//! │    WHERE status = 'PENDING_PAYMENT' AND created_at < cutoff             │
//! │    ORDER BY created_at                                                  │
//! │                                                                         │
//! │    for each id: OrderService cancel path (reason EXPIRED)               │
//! │      ├─ cancelled          ──► count += 1                               │
//! │      ├─ no longer pending  ──► skip silently                            │
//! │      └─ other failure      ──► error!, continue with the next order     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use storehold_core::{CancelReason, CoreError};

use crate::error::{EngineError, EngineResult};
use crate::Engine;

/// One sweep over the expired pending orders, oldest first.
pub(crate) async fn sweep_expired(engine: &Engine) -> EngineResult<usize> {
    let cutoff = engine.now() - engine.config().orders.expiry();
    let expired = engine.db().orders().expired_pending_ids(cutoff).await?;

    if expired.is_empty() {
        debug!(%cutoff, "No expired orders");
        return Ok(0);
    }

    let orders = engine.orders();
    let mut cancelled = 0;

    for order_id in &expired {
        match orders.cancel_with_reason(order_id, CancelReason::Expired).await {
            Ok(_) => cancelled += 1,
            Err(EngineError::Core(CoreError::InvalidTransition { from, .. })) => {
                debug!(order_id = %order_id, %from, "Order settled before sweep reached it");
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Failed to expire order");
            }
        }
    }

    info!(candidates = expired.len(), cancelled, "Expiry sweep complete");
    Ok(cancelled)
}

// =============================================================================
// Background loop
// =============================================================================

/// Runs [`Engine::run_expiry_sweep`] on a fixed interval.
pub struct ExpirySweeper {
    engine: Engine,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping an [`ExpirySweeper`].
#[derive(Debug, Clone)]
pub struct ExpirySweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl ExpirySweeperHandle {
    /// Stops the loop after the sweep in progress, if any, finishes.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Expiry sweeper already stopped");
        }
    }
}

impl ExpirySweeper {
    pub fn new(engine: Engine) -> (Self, ExpirySweeperHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            ExpirySweeper {
                engine,
                shutdown_rx,
            },
            ExpirySweeperHandle { shutdown_tx },
        )
    }

    /// Runs the sweep loop. The first sweep happens immediately.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        let period = self.engine.config().orders.sweep_interval();
        info!(
            interval_secs = period.as_secs(),
            expiry_hours = self.engine.config().orders.expiry_hours,
            "Expiry sweeper starting"
        );

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.engine.run_expiry_sweep().await {
                        error!(error = %e, "Expiry sweep failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Expiry sweeper shutting down");
                    break;
                }
            }
        }

        info!("Expiry sweeper stopped");
    }
}
