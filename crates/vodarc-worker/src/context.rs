//! Typed dependency context threaded into every job invocation.
//!
//! One `Deps` value is built at process start and shared by all workers.
//! Required collaborators are plain fields; optional or late-bound ones are
//! reached through accessors that fail with a missing-dependency error —
//! a configuration problem, kept distinct from transient job failures so
//! it never consumes a retry attempt.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use vodarc_models::Platform;
use vodarc_platform::{PlatformSource, TokenCache};
use vodarc_queue::JobQueue;
use vodarc_store::ArchiveStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::media::MediaRunner;

/// Live-broadcast monitoring service, probed by the watchdog.
#[async_trait]
pub trait LiveMonitor: Send + Sync {
    /// Cheap liveness probe.
    async fn ping(&self) -> WorkerResult<()>;
}

/// Shared collaborators for job handlers.
pub struct Deps {
    store: Arc<dyn ArchiveStore>,
    tokens: Arc<TokenCache>,
    config: WorkerConfig,
    sources: HashMap<Platform, Arc<dyn PlatformSource>>,
    live_monitor: Option<Arc<dyn LiveMonitor>>,
    media: Option<Arc<dyn MediaRunner>>,
    queue: OnceLock<Arc<JobQueue<Deps>>>,
}

impl Deps {
    /// Create a context over the required collaborators.
    pub fn new(store: Arc<dyn ArchiveStore>, tokens: Arc<TokenCache>, config: WorkerConfig) -> Self {
        Self {
            store,
            tokens,
            config,
            sources: HashMap::new(),
            live_monitor: None,
            media: None,
            queue: OnceLock::new(),
        }
    }

    /// Attach a platform source.
    pub fn with_source(mut self, source: Arc<dyn PlatformSource>) -> Self {
        self.sources.insert(source.platform(), source);
        self
    }

    /// Attach the live-monitoring service.
    pub fn with_live_monitor(mut self, monitor: Arc<dyn LiveMonitor>) -> Self {
        self.live_monitor = Some(monitor);
        self
    }

    /// Attach the media runner.
    pub fn with_media(mut self, media: Arc<dyn MediaRunner>) -> Self {
        self.media = Some(media);
        self
    }

    /// Late-bind the job queue so handlers can enqueue follow-up work.
    ///
    /// The queue is built after the registry (which already needs the
    /// context type), hence the one-shot binding instead of a constructor
    /// argument.
    pub fn attach_queue(&self, queue: Arc<JobQueue<Deps>>) {
        let _ = self.queue.set(queue);
    }

    pub fn store(&self) -> &Arc<dyn ArchiveStore> {
        &self.store
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Source for a platform, or a missing-dependency error when the
    /// platform was not configured.
    pub fn source(&self, platform: Platform) -> WorkerResult<Arc<dyn PlatformSource>> {
        self.sources
            .get(&platform)
            .cloned()
            .ok_or_else(|| WorkerError::dependency_missing(format!("{platform} source")))
    }

    /// The live-monitoring service, if configured.
    pub fn live_monitor(&self) -> Option<&Arc<dyn LiveMonitor>> {
        self.live_monitor.as_ref()
    }

    /// The media runner, or a missing-dependency error.
    pub fn media(&self) -> WorkerResult<Arc<dyn MediaRunner>> {
        self.media
            .clone()
            .ok_or_else(|| WorkerError::dependency_missing("media runner"))
    }

    /// The job queue, or a missing-dependency error before `attach_queue`.
    pub fn queue(&self) -> WorkerResult<&Arc<JobQueue<Deps>>> {
        self.queue
            .get()
            .ok_or_else(|| WorkerError::dependency_missing("job queue"))
    }
}
