//! Periodic refresh of the evaluation dataset.
//!
//! Every period the scheduler re-issues the current filter through
//! [`CascadeController::apply_filter`]. The first tick fires one full period
//! after [`RefreshScheduler::spawn`]; a tick that comes due while a refresh
//! is still running is delayed, never stacked. The catalog is not re-fetched.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RefreshConfig;
use crate::controller::CascadeController;

/// Fixed-period driver for `apply_filter`.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    controller: CascadeController,
    period: Duration,
}

impl RefreshScheduler {
    pub fn new(controller: CascadeController, config: &RefreshConfig) -> Self {
        Self {
            controller,
            period: Duration::from_millis(config.interval_ms.max(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start refreshing on the current runtime.
    pub fn spawn(self) -> RefreshHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = self.period;

        info!(period_ms = period.as_millis() as u64, "Starting refresh scheduler");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut completed = 0u64;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        // Failures are logged by the controller; keep ticking.
                        let outcome = self.controller.apply_filter().await;
                        completed += 1;
                        debug!(tick = completed, ok = outcome.is_ok(), "Refresh tick");
                    }
                }
            }
            completed
        });

        RefreshHandle { cancel, task }
    }
}

/// Handle to a running scheduler. Dropping it leaves the task running.
#[derive(Debug)]
pub struct RefreshHandle {
    cancel: CancellationToken,
    task: JoinHandle<u64>,
}

impl RefreshHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the scheduler and wait for it. A refresh already in progress
    /// finishes first. Returns how many refreshes ran.
    pub async fn shutdown(self) -> u64 {
        self.cancel.cancel();
        let completed = self.task.await.unwrap_or(0);
        info!(completed, "Refresh scheduler stopped");
        completed
    }
}
