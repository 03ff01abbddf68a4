//! Fixed-period control loop
//!
//! Runs one tick, then waits for the next period or for shutdown, whichever
//! comes first. A failed tick is logged and the next one proceeds unchanged;
//! the fixed cadence is the only retry.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{FanError, Result};

/// Maximum consecutive tick errors logged individually before summarizing
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Handle to a running control loop
#[derive(Debug)]
pub struct PollLoop {
    name: String,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollLoop {
    /// Spawn the loop on the current tokio runtime
    ///
    /// `tick` is called once immediately and then once per `interval`.
    pub fn spawn<F, Fut>(name: impl Into<String>, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            info!(fan = %task_name, interval_ms = interval.as_millis() as u64, "Control loop starting");
            let mut consecutive_errors: u32 = 0;

            loop {
                match tick().await {
                    Ok(()) => {
                        if consecutive_errors > 0 {
                            debug!(fan = %task_name, "Control loop recovered after {} errors", consecutive_errors);
                            consecutive_errors = 0;
                        }
                    }
                    Err(e) => {
                        consecutive_errors = consecutive_errors.saturating_add(1);
                        // Non-transient failures are never rate limited
                        if !e.is_transient()
                            || consecutive_errors <= MAX_CONSECUTIVE_ERRORS
                            || consecutive_errors % MAX_CONSECUTIVE_ERRORS == 0
                        {
                            error!(fan = %task_name, count = consecutive_errors, error = %e, "Control tick failed");
                        }
                    }
                }

                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }

            info!(fan = %task_name, "Control loop stopped");
        });

        Self {
            name,
            shutdown_tx,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task is still alive
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the loop and wait until it has exited
    ///
    /// A tick already in flight is allowed to finish; no new tick starts.
    pub async fn shutdown(self) -> Result<()> {
        debug!(fan = %self.name, "Notifying control loop to shut down");
        if self.shutdown_tx.send(true).is_err() {
            debug!(fan = %self.name, "Control loop had already exited");
        }
        self.handle
            .await
            .map_err(|e| FanError::Task(format!("control loop for {} failed: {}", self.name, e)))
    }
}

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Idle,
    Running(PollLoop),
    Stopped,
}

/// Lifecycle of a controller's loop
///
/// Empty until the first configuration, holds the loop afterwards and is
/// closed for good by [`LoopSlot::close`]. A closed slot never spawns again.
#[derive(Debug, Default)]
pub(crate) struct LoopSlot {
    state: Mutex<SlotState>,
}

impl LoopSlot {
    /// Spawn the loop unless one is alive; fails once the slot is closed
    pub(crate) fn start_with(&self, spawn: impl FnOnce() -> PollLoop) -> Result<()> {
        let mut state = self.state.lock();
        match &*state {
            SlotState::Stopped => Err(FanError::NotRunning),
            SlotState::Running(poll) if poll.is_running() => Ok(()),
            _ => {
                *state = SlotState::Running(spawn());
                Ok(())
            }
        }
    }

    /// Close the slot and hand back the loop to stop
    pub(crate) fn close(&self) -> Result<PollLoop> {
        match std::mem::replace(&mut *self.state.lock(), SlotState::Stopped) {
            SlotState::Running(poll) => Ok(poll),
            SlotState::Idle | SlotState::Stopped => Err(FanError::NotRunning),
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Stopped)
    }

    pub(crate) fn is_running(&self) -> bool {
        matches!(&*self.state.lock(), SlotState::Running(poll) if poll.is_running())
    }
}
