//! Periodic heartbeat task.
//!
//! Runs [`ExchangeEngine::heartbeat`] on a fixed delay until stopped. The
//! first probe fires one full interval after spawning; if a probe takes
//! longer than the interval, the next one is pushed back rather than fired
//! in a burst.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, trace};

use crate::error::{Error, Result};

use super::engine::ExchangeEngine;

// ============================================================================
// Heartbeat
// ============================================================================

/// Spawner for the heartbeat task.
pub struct Heartbeat;

impl Heartbeat {
    /// Spawns the heartbeat loop on the current tokio runtime.
    ///
    /// The task ends when [`HeartbeatHandle::stop`] is called or the handle
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `interval` is zero.
    pub fn spawn(engine: Arc<ExchangeEngine>, interval: Duration) -> Result<HeartbeatHandle> {
        if interval.is_zero() {
            return Err(Error::config("heartbeat interval must be greater than zero"));
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(Self::run(engine, interval, shutdown_rx));

        info!(interval_ms = interval.as_millis() as u64, "Heartbeat started");

        Ok(HeartbeatHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    async fn run(
        engine: Arc<ExchangeEngine>,
        interval: Duration,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Fires on explicit stop and when the handle is dropped.
                _ = &mut shutdown_rx => {
                    debug!("Heartbeat shutdown received");
                    break;
                }

                _ = ticker.tick() => {
                    let outcome = engine.heartbeat().await;
                    trace!(?outcome, "Heartbeat tick");
                }
            }
        }

        debug!("Heartbeat loop terminated");
    }
}

// ============================================================================
// HeartbeatHandle
// ============================================================================

/// Owner of a running heartbeat task.
#[derive(Debug)]
pub struct HeartbeatHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    /// Returns `true` while the task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the task and waits for it to finish.
    ///
    /// A probe already in flight completes first, so this waits at most one
    /// connect plus one read timeout.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            debug!(error = %e, "Heartbeat task ended abnormally");
        }

        info!("Heartbeat stopped");
    }
}

// ============================================================================
// Tests
// ============================================================================
