//! Periodic eviction of idle sessions.

use std::sync::Arc;
use std::time::Duration;

use ideaforge_core::session::SessionStore;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// `tracing` target for sweeper events.
pub const SWEEPER_TARGET: &str = "ideaforge::sessions";

/// Spawns a task that sweeps `store` every `every`, evicting sessions idle
/// for longer than `max_idle`.
///
/// The first sweep runs immediately. The task exits when `cancel` fires; a
/// failed sweep is logged and retried on the next tick.
pub fn spawn_session_sweeper(
    store: Arc<dyn SessionStore>,
    every: Duration,
    max_idle: chrono::Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(target: SWEEPER_TARGET, "Session sweeper started ({}s interval)", every.as_secs());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match store.sweep(max_idle).await {
                Ok(0) => tracing::debug!(target: SWEEPER_TARGET, "Tick - no stale sessions"),
                Ok(evicted) => tracing::info!(target: SWEEPER_TARGET, evicted, "Evicted stale sessions"),
                Err(e) => tracing::error!(target: SWEEPER_TARGET, "Session sweep failed: {}", e),
            }
        }

        tracing::info!(target: SWEEPER_TARGET, "Session sweeper stopped");
    })
}
