//! Port calls on the blocking pool
//!
//! Sensor and pin drivers may sleep on slow buses. Running them through
//! `spawn_blocking` keeps the executor free for status queries.

use crate::error::{FanError, Result};

/// Run a blocking port call without stalling the executor
pub(crate) async fn run_blocking<T, F>(what: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FanError::Task(format!("{} task panicked: {}", what, e)))?
}
