//! runwatch -- execution tracker for a remote test-automation backend.
//!
//! This crate keeps a local, eventually-consistent view of the backend's
//! executions by polling its HTTP API, hydrates per-execution detail on
//! demand, and projects the result into a three-level tree for display.

pub mod api;
pub mod artifact;
pub mod cache;
pub mod config;
pub mod display;
pub mod notify;
pub mod scheduler;
pub mod tree;

use std::sync::Arc;

use anyhow::Result;

use crate::api::{ExecutionApi, HttpExecutionClient};
use crate::artifact::ArtifactClassifier;
use crate::cache::ExecutionCache;
use crate::config::TrackerConfig;
use crate::notify::ChangeNotifier;
use crate::scheduler::{ExecutionPoller, PollOutcome, PollingScheduler};
use crate::tree::TreeProjector;

/// The wired-up core: client, cache, poller, scheduler, and projector.
pub struct Tracker {
    cache: Arc<ExecutionCache>,
    notifier: ChangeNotifier,
    poller: Arc<ExecutionPoller>,
    scheduler: PollingScheduler,
    projector: TreeProjector,
}

impl Tracker {
    /// Build a tracker that talks HTTP to the configured backend.
    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        tracing::info!(base_url = %config.backend.base_url, "Initializing backend client");
        let client = HttpExecutionClient::new(
            &config.backend.base_url,
            config.backend.request_timeout(),
        )?;
        Ok(Self::with_api(Arc::new(client), config))
    }

    /// Build a tracker over any [`ExecutionApi`] implementation.
    pub fn with_api(api: Arc<dyn ExecutionApi>, config: &TrackerConfig) -> Self {
        let cache = Arc::new(ExecutionCache::new(api.clone()));
        let notifier = ChangeNotifier::new();
        let poller = Arc::new(ExecutionPoller::new(api, cache.clone(), notifier.clone()));

        let scheduler = PollingScheduler::new(poller.clone(), config.polling.interval());
        scheduler.set_enabled(config.polling.enabled);

        let projector = TreeProjector::new(cache.clone(), Arc::new(ArtifactClassifier::default()))
            .with_artifact_root(config.artifacts.root.clone());

        Self {
            cache,
            notifier,
            poller,
            scheduler,
            projector,
        }
    }

    pub fn cache(&self) -> &Arc<ExecutionCache> {
        &self.cache
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn projector(&self) -> &TreeProjector {
        &self.projector
    }

    pub fn scheduler(&self) -> &PollingScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut PollingScheduler {
        &mut self.scheduler
    }

    /// One poll outside the scheduler.
    pub async fn poll_once(&self) -> PollOutcome {
        self.poller.poll_once().await
    }
}
