//! Periodic re-sync of every subscription.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::error::{ChaosCalError, ChaosCalResult};
use crate::hub::CalendarHub;

/// Background task that calls [`CalendarHub::sync_all`] once per period.
///
/// The subscription set is read at each tick, so feeds added or removed
/// after start are picked up without restarting. The task is aborted when
/// the scheduler is dropped. Fetches already in flight at that point run to
/// completion.
pub struct SyncScheduler {
    handle: JoinHandle<()>,
    period: Duration,
}

impl SyncScheduler {
    /// Spawn the timer on the current tokio runtime. The first tick fires one
    /// `period` after start. A zero `period` is rejected.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(hub: CalendarHub, period: Duration) -> ChaosCalResult<Self> {
        if period.is_zero() {
            return Err(ChaosCalError::Config(
                "sync interval must be greater than zero".into(),
            ));
        }

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let reports = hub.sync_all().await;
                tracing::debug!("Periodic sync finished for {} subscription(s)", reports.len());
            }
        });

        tracing::debug!("Sync scheduler started, period {:?}", period);
        Ok(SyncScheduler { handle, period })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the timer. Same as dropping the scheduler.
    pub fn stop(self) {}
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!("Sync scheduler stopped");
    }
}
