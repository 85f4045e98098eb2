//! Background refresh loop

use super::PriceFeed;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Owns the refresh task. Dropping the handle stops the loop.
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the loop now. Equivalent to dropping the handle.
    pub fn stop(self) {}

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl PriceFeed {
    /// Spawn the periodic refresh on the current runtime.
    ///
    /// Ticks run one at a time: a refresh slower than the interval delays the
    /// next one and late ticks are skipped. The first tick fires one interval
    /// after start.
    pub fn start_refresh(&self) -> RefreshHandle {
        let feed = self.clone();
        let period = self.config.refresh_interval;

        let task = tokio::spawn(async move {
            info!("Price refresh loop started (interval: {:?})", period);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if feed.is_closed() {
                    debug!("Feed closed, stopping refresh loop");
                    break;
                }
                feed.refresh().await;
            }
        });

        RefreshHandle { task }
    }
}
