//! Local, eventually-consistent view of remote executions.
//!
//! The cache maps `execution_id` to the latest polled brief plus the
//! execution detail, once something has asked for it. Every mutation is a
//! point update made under a short lock that is never held across an
//! `.await`, so background polls and UI-driven hydration can interleave
//! freely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::api::{ApiError, ExecutionApi, ExecutionBrief, ExecutionDetail};

/// What the cache knows about one execution.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub brief: ExecutionBrief,
    /// Populated on first hydration and retained until the entry is evicted.
    pub details: Option<Arc<ExecutionDetail>>,
}

pub struct ExecutionCache {
    api: Arc<dyn ExecutionApi>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ExecutionCache {
    pub fn new(api: Arc<dyn ExecutionApi>) -> Self {
        Self {
            api,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold a freshly polled brief list into the cache.
    ///
    /// Returns `true` when anything visible changed. Stored details survive
    /// brief updates, and ids missing from `fresh` are kept.
    pub fn reconcile(&self, fresh: Vec<ExecutionBrief>) -> bool {
        let mut entries = self.lock();
        let mut changed = false;

        for brief in fresh {
            match entries.get_mut(&brief.execution_id) {
                None => {
                    debug!(execution_id = %brief.execution_id, status = %brief.status, "new execution");
                    entries.insert(
                        brief.execution_id.clone(),
                        CacheEntry {
                            brief,
                            details: None,
                        },
                    );
                    changed = true;
                }
                Some(entry) => {
                    let finished =
                        !entry.brief.status.is_terminal() && brief.status.is_terminal();
                    if finished {
                        info!(
                            execution_id = %brief.execution_id,
                            status = %brief.status,
                            "execution finished"
                        );
                    }
                    if finished || entry.brief != brief {
                        entry.brief = brief;
                        changed = true;
                    }
                }
            }
        }

        changed
    }

    /// Cached detail for `execution_id`, without touching the network.
    pub fn get_detail(&self, execution_id: &str) -> Option<Arc<ExecutionDetail>> {
        self.lock()
            .get(execution_id)
            .and_then(|entry| entry.details.clone())
    }

    /// Cached detail, fetching and storing it on first use.
    ///
    /// A `NotFound` from the backend evicts the entry. If the entry was
    /// evicted while the fetch was in flight, a successful fetch re-inserts
    /// it from the detail's own brief.
    pub async fn hydrate(&self, execution_id: &str) -> Result<Arc<ExecutionDetail>, ApiError> {
        if let Some(detail) = self.get_detail(execution_id) {
            return Ok(detail);
        }

        debug!(%execution_id, "hydrating execution detail");
        match self.api.get_execution_detail(execution_id).await {
            Ok(detail) => {
                let detail = Arc::new(detail);
                let mut entries = self.lock();
                let entry = entries
                    .entry(execution_id.to_string())
                    .or_insert_with(|| CacheEntry {
                        brief: detail.brief.clone(),
                        details: None,
                    });
                // A concurrent hydration may have landed first; keep its copy.
                let stored = entry.details.get_or_insert_with(|| detail.clone()).clone();
                Ok(stored)
            }
            Err(err) if err.is_not_found() => {
                warn!(%execution_id, "execution vanished from backend, evicting");
                self.evict(execution_id);
                Err(err)
            }
            Err(err) => {
                warn!(%execution_id, error = %err, "failed to hydrate execution");
                Err(err)
            }
        }
    }

    pub fn brief(&self, execution_id: &str) -> Option<ExecutionBrief> {
        self.lock().get(execution_id).map(|e| e.brief.clone())
    }

    pub fn contains(&self, execution_id: &str) -> bool {
        self.lock().contains_key(execution_id)
    }

    /// Point-in-time copy of every entry, in no particular order.
    pub fn snapshot(&self) -> Vec<CacheEntry> {
        self.lock().values().cloned().collect()
    }

    /// Drop one entry. Returns whether it was present. Not a tombstone: the
    /// next poll that lists the id re-creates it.
    pub fn evict(&self, execution_id: &str) -> bool {
        self.lock().remove(execution_id).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
