//! The refresh callback: list executions, reconcile, announce changes.

use std::sync::Arc;

use tracing::{debug, warn};

use super::RefreshTask;
use crate::api::ExecutionApi;
use crate::cache::ExecutionCache;
use crate::notify::ChangeNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Changed,
    Unchanged,
    /// The backend could not be read this round; the cache was left alone.
    Skipped,
}

pub struct ExecutionPoller {
    api: Arc<dyn ExecutionApi>,
    cache: Arc<ExecutionCache>,
    notifier: ChangeNotifier,
}

impl ExecutionPoller {
    pub fn new(api: Arc<dyn ExecutionApi>, cache: Arc<ExecutionCache>, notifier: ChangeNotifier) -> Self {
        Self { api, cache, notifier }
    }

    pub async fn poll_once(&self) -> PollOutcome {
        let fresh = match self.api.list_executions().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "execution poll failed, keeping previous state");
                return PollOutcome::Skipped;
            }
        };

        let count = fresh.len();
        if self.cache.reconcile(fresh) {
            debug!(listed = count, cached = self.cache.len(), "executions changed");
            self.notifier.notify();
            PollOutcome::Changed
        } else {
            PollOutcome::Unchanged
        }
    }
}

#[async_trait::async_trait]
impl RefreshTask for ExecutionPoller {
    async fn refresh(&self) -> anyhow::Result<()> {
        self.poll_once().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ExecutionBrief, ExecutionDetail, ExecutionStatus};
    use crate::cache::tests::{brief, FakeApi};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Down {
        malformed: AtomicBool,
    }

    #[async_trait::async_trait]
    impl ExecutionApi for Down {
        async fn list_executions(&self) -> Result<Vec<ExecutionBrief>, ApiError> {
            let url = "http://backend/executions".to_string();
            if self.malformed.load(Ordering::SeqCst) {
                Err(ApiError::MalformedResponse { url, reason: "expected array".into() })
            } else {
                Err(ApiError::Network { url, reason: "connection refused".into() })
            }
        }

        async fn get_execution_detail(&self, execution_id: &str) -> Result<ExecutionDetail, ApiError> {
            Err(ApiError::NotFound { execution_id: execution_id.to_string() })
        }
    }

    #[tokio::test]
    async fn test_poll_notifies_only_on_change() {
        let api = Arc::new(FakeApi::default());
        api.set_list(vec![brief("a", ExecutionStatus::Running, 1)]);
        let cache = Arc::new(ExecutionCache::new(api.clone()));
        let notifier = ChangeNotifier::new();
        let poller = ExecutionPoller::new(api.clone(), cache.clone(), notifier.clone());

        assert_eq!(poller.poll_once().await, PollOutcome::Changed);
        assert_eq!(poller.poll_once().await, PollOutcome::Unchanged);
        assert_eq!(notifier.generation(), 1);

        api.set_list(vec![brief("a", ExecutionStatus::Completed, 1)]);
        assert_eq!(poller.poll_once().await, PollOutcome::Changed);
        assert_eq!(notifier.generation(), 2);
    }

    #[tokio::test]
    async fn test_backend_failures_keep_cache() {
        let fake = Arc::new(FakeApi::default());
        let cache = Arc::new(ExecutionCache::new(fake));
        cache.reconcile(vec![brief("a", ExecutionStatus::Running, 1)]);

        let down = Arc::new(Down { malformed: AtomicBool::new(false) });
        let notifier = ChangeNotifier::new();
        let poller = ExecutionPoller::new(down.clone(), cache.clone(), notifier.clone());

        assert_eq!(poller.poll_once().await, PollOutcome::Skipped);
        down.malformed.store(true, Ordering::SeqCst);
        assert_eq!(poller.poll_once().await, PollOutcome::Skipped);
        assert!(poller.refresh().await.is_ok());

        assert!(cache.contains("a"));
        assert_eq!(notifier.generation(), 0);
    }
}
