use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use super::RefreshTask;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Owns the polling timer and its start/stop/toggle lifecycle.
///
/// Ticks are scheduled from when the previous tick was due, not from when
/// its refresh finished. A refresh still running when the next tick comes
/// due delays that tick and missed ticks are skipped, so refreshes never
/// overlap.
pub struct PollingScheduler {
    task: Arc<dyn RefreshTask>,
    interval: Duration,
    enabled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PollingScheduler {
    pub fn new(task: Arc<dyn RefreshTask>, interval: Duration) -> Self {
        Self {
            task,
            interval,
            enabled: Arc::new(AtomicBool::new(true)),
            handle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Refresh once right away, then keep refreshing every interval.
    ///
    /// Calling `start` again replaces the running timer.
    pub async fn start(&mut self) {
        self.stop();

        run_tick(&self.task, &self.enabled).await;

        let task = self.task.clone();
        let enabled = self.enabled.clone();
        let interval = self.interval;
        info!(interval_ms = interval.as_millis() as u64, "polling started");

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                run_tick(&task, &enabled).await;
            }
        }));
    }

    /// Stop issuing new refreshes. One already in flight runs to completion.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("polling stopped");
        }
    }

    /// Flip the enabled flag. The timer keeps running; ticks while disabled
    /// do nothing. Returns the new state.
    pub fn toggle(&self) -> bool {
        let now_enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        info!(enabled = now_enabled, "polling toggled");
        now_enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One tick. The refresh runs on its own task so that neither an error nor
/// a panic inside it can end the polling loop.
async fn run_tick(task: &Arc<dyn RefreshTask>, enabled: &AtomicBool) {
    if !enabled.load(Ordering::SeqCst) {
        trace!("polling disabled, skipping tick");
        return;
    }

    let task = task.clone();
    match tokio::spawn(async move { task.refresh().await }).await {
        Ok(Ok(())) => debug!("refresh tick complete"),
        Ok(Err(e)) => warn!(error = %e, "refresh failed"),
        Err(e) if e.is_panic() => error!("refresh panicked; polling continues"),
        Err(e) => warn!(error = %e, "refresh task cancelled"),
    }
}
