//! Job kind table and registration.
//!
//! Kind names are the wire identifiers persisted with queued jobs; queues
//! are independent concurrency domains. Everything retry/timeout-related
//! lives in the descriptor table here, not in per-kind types.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vodarc_queue::{
    HandlerFuture, JobDescriptor, JobRegistry, PeriodicJob, PoolConfig, QueueResult,
};
use vodarc_store::VideoUid;

use crate::config::WorkerConfig;
use crate::context::Deps;
use crate::error::{WorkerError, WorkerResult};
use crate::{archive, backfill, channels, reconcile, watchdog};

/// Wire identifiers of all job kinds.
pub mod kinds {
    pub const HEALTH_CHECK: &str = "health_check";
    pub const CHECK_CHANNELS: &str = "check_channels";
    pub const DOWNLOAD_VIDEO: &str = "download_video";
    pub const POSTPROCESS_VIDEO: &str = "postprocess_video";
    pub const MOVE_VIDEO: &str = "move_video";
    pub const DOWNLOAD_CHAT: &str = "download_chat";
    pub const RENDER_CHAT: &str = "render_chat";
    pub const MOVE_CHAT: &str = "move_chat";
    pub const BACKFILL_CHAPTERS: &str = "backfill_chapters";
    pub const RECONCILE_VOD_IDS: &str = "reconcile_vod_ids";
}

/// Named queues (independent concurrency domains).
pub mod queues {
    pub const DEFAULT: &str = "default";
    pub const ARCHIVE: &str = "archive";
    pub const POSTPROCESS: &str = "postprocess";
    pub const CHAT_RENDER: &str = "chat-render";
}

/// Arguments of the per-video pipeline jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoJobArgs {
    pub video_id: VideoUid,
}

fn descriptor(
    kind: &'static str,
    queue: &'static str,
    max_attempts: u32,
    timeout: Duration,
) -> JobDescriptor {
    JobDescriptor {
        kind,
        queue,
        max_attempts,
        timeout,
    }
}

/// Adapt a worker handler into the queue layer's handler shape, mapping
/// `WorkerError` into the retryable/fatal classification.
fn wrap<F, Fut>(handler: F) -> impl Fn(Arc<Deps>, serde_json::Value) -> HandlerFuture + Send + Sync
where
    F: Fn(Arc<Deps>, serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WorkerResult<()>> + Send + 'static,
{
    move |deps, args| {
        let fut = handler(deps, args);
        Box::pin(async move { fut.await.map_err(WorkerError::into_job_error) })
    }
}

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(24 * 3600);

/// Register every job kind. Called once at process start.
pub fn register_all(registry: &mut JobRegistry<Deps>) -> QueueResult<()> {
    registry.register(
        descriptor(kinds::HEALTH_CHECK, queues::DEFAULT, 1, Duration::from_secs(60)),
        wrap(watchdog::health_check),
    )?;
    registry.register(
        descriptor(kinds::CHECK_CHANNELS, queues::DEFAULT, 3, Duration::from_secs(600)),
        wrap(channels::check_channels),
    )?;
    registry.register(
        descriptor(kinds::DOWNLOAD_VIDEO, queues::ARCHIVE, 5, DAY),
        wrap(archive::download_video),
    )?;
    registry.register(
        descriptor(kinds::POSTPROCESS_VIDEO, queues::POSTPROCESS, 3, DAY),
        wrap(archive::postprocess_video),
    )?;
    registry.register(
        descriptor(kinds::MOVE_VIDEO, queues::ARCHIVE, 3, HOUR),
        wrap(archive::move_video),
    )?;
    registry.register(
        descriptor(kinds::DOWNLOAD_CHAT, queues::ARCHIVE, 5, DAY),
        wrap(archive::download_chat),
    )?;
    registry.register(
        descriptor(kinds::RENDER_CHAT, queues::CHAT_RENDER, 3, DAY),
        wrap(archive::render_chat),
    )?;
    registry.register(
        descriptor(kinds::MOVE_CHAT, queues::ARCHIVE, 3, HOUR),
        wrap(archive::move_chat),
    )?;
    registry.register(
        descriptor(kinds::BACKFILL_CHAPTERS, queues::DEFAULT, 1, HOUR),
        wrap(backfill::backfill_chapters),
    )?;
    registry.register(
        descriptor(kinds::RECONCILE_VOD_IDS, queues::DEFAULT, 1, HOUR),
        wrap(reconcile::reconcile_vod_ids),
    )?;
    Ok(())
}

/// Per-queue worker slot caps from the worker configuration.
pub fn pool_config(config: &WorkerConfig) -> PoolConfig {
    PoolConfig {
        default_workers: config.default_workers,
        ..Default::default()
    }
    .with_queue_workers(queues::ARCHIVE, config.archive_workers)
    .with_queue_workers(queues::POSTPROCESS, config.postprocess_workers)
    .with_queue_workers(queues::CHAT_RENDER, config.chat_render_workers)
}

/// The fixed set of recurring enqueue rules.
pub fn periodic_jobs(config: &WorkerConfig) -> Vec<PeriodicJob> {
    vec![
        PeriodicJob::new(kinds::HEALTH_CHECK, config.health_check_interval, || {
            serde_json::json!({})
        })
        .with_run_on_start(true),
        PeriodicJob::new(kinds::CHECK_CHANNELS, config.check_channels_interval, || {
            serde_json::json!({})
        }),
        PeriodicJob::new(kinds::BACKFILL_CHAPTERS, config.backfill_interval, || {
            serde_json::json!({})
        }),
        PeriodicJob::new(kinds::RECONCILE_VOD_IDS, config.reconcile_interval, || {
            serde_json::json!({})
        }),
    ]
}
