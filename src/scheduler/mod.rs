//! Periodic refresh: the polling timer and the poll it drives.

pub mod engine;
pub mod poller;

pub use self::engine::{PollingScheduler, DEFAULT_POLL_INTERVAL};
pub use self::poller::{ExecutionPoller, PollOutcome};

/// Work run on every scheduler tick.
///
/// An `Err` is logged by the scheduler and never stops later ticks.
#[async_trait::async_trait]
pub trait RefreshTask: Send + Sync + 'static {
    async fn refresh(&self) -> anyhow::Result<()>;
}
