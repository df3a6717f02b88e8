//! Chapter and muted-segment backfill.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use vodarc_models::MutedSegment;
use vodarc_platform::PlatformSource;
use vodarc_store::{StoredChapter, StoredMutedSegment, StoredVideo};

use crate::context::Deps;
use crate::error::WorkerResult;

/// Backfill chapters and muted segments for archived videos missing them.
///
/// Persists only when nothing is stored yet for the video, so a repeated
/// run is a no-op. Per-video failures are logged and the batch continues;
/// the next interval retries them safely.
pub(crate) async fn backfill_chapters(deps: Arc<Deps>, _args: serde_json::Value) -> WorkerResult<()> {
    let videos = deps.store().list_videos_missing_chapters().await?;
    if videos.is_empty() {
        return Ok(());
    }
    info!(count = videos.len(), "Backfilling chapters and muted segments");

    for video in &videos {
        let channel = deps.store().get_channel(video.channel_id).await?;
        let source = deps.source(channel.platform)?;
        if let Err(e) = backfill_one(&deps, source, video).await {
            warn!(video = %video.id, ext_id = %video.ext_id, "Backfill failed: {e}");
        }
        tokio::time::sleep(deps.config().item_delay).await;
    }
    Ok(())
}

async fn backfill_one(
    deps: &Arc<Deps>,
    source: Arc<dyn PlatformSource>,
    video: &StoredVideo,
) -> WorkerResult<()> {
    let info = source.get_video(&video.ext_id, true, true).await?;
    let store = deps.store();

    if !info.chapters.is_empty() && store.list_chapters(video.id).await?.is_empty() {
        let rows = info
            .chapters
            .iter()
            .map(|c| StoredChapter {
                id: Uuid::new_v4(),
                video_id: video.id,
                ext_id: c.id.clone(),
                kind: c.kind.clone(),
                title: c.title.clone(),
                start: c.start,
                end: c.end,
            })
            .collect();
        store.insert_chapters(video.id, rows).await?;
        info!(video = %video.id, chapters = info.chapters.len(), "Stored chapters");
    }

    if !info.muted_segments.is_empty() && store.list_muted_segments(video.id).await?.is_empty() {
        let rows = info
            .muted_segments
            .iter()
            .map(|s| {
                // Clip against the locally recorded duration as well.
                let clipped = MutedSegment::clipped(s.offset, s.duration, video.duration);
                StoredMutedSegment {
                    id: Uuid::new_v4(),
                    video_id: video.id,
                    start: clipped.offset,
                    end: clipped.end(),
                }
            })
            .collect();
        store.insert_muted_segments(video.id, rows).await?;
        info!(video = %video.id, segments = info.muted_segments.len(), "Stored muted segments");
    }

    Ok(())
}
