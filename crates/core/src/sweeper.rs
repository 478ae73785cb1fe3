//! Background expiry sweep.
//!
//! Ownership checks never depend on this task — expiry is re-derived from
//! the clock on every read — but without it the lock table would grow
//! with dead entries and `holder_of` callers would keep paying for
//! eviction on the hot path. Runs through the same synchronized service
//! entry point as request handlers; there is no second data path.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::SessionService;

/// Spawns the periodic sweep task.
///
/// Send `true` on the returned channel to stop it. The task never
/// reports errors upward; a sweep is a pure in-memory operation.
pub fn spawn(
	sessions: Arc<SessionService>,
	interval: Duration,
) -> (watch::Sender<bool>, JoinHandle<()>) {
	let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

	let handle = tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
		// The first tick fires immediately; skip it so a fresh broker
		// does not sweep an empty table.
		ticker.tick().await;

		loop {
			tokio::select! {
				changed = shutdown_rx.changed() => {
					if changed.is_err() || *shutdown_rx.borrow() {
						break;
					}
				}
				_ = ticker.tick() => {
					let evicted = sessions.sweep_now();
					if evicted > 0 {
						debug!(target = "teleop.sweep", evicted, "released expired sessions");
					}
				}
			}
		}
		debug!(target = "teleop.sweep", "sweeper stopped");
	});

	(shutdown_tx, handle)
}
