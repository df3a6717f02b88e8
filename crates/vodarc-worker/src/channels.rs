//! Watched-channel polling.

use std::sync::Arc;

use tracing::{info, warn};

use vodarc_models::{Platform, VideoType};
use vodarc_platform::PlatformSource;
use vodarc_store::{StoredChannel, StoredVideo};

use crate::context::Deps;
use crate::error::WorkerResult;
use crate::jobs::{kinds, VideoJobArgs};

/// The identifier a platform's video listing is keyed by: Helix lists by
/// channel id, Kick by slug.
pub(crate) fn platform_channel_ref(channel: &StoredChannel) -> &str {
    match channel.platform {
        Platform::Twitch => &channel.ext_id,
        Platform::Kick => &channel.name,
    }
}

/// Poll every watched channel for videos not yet recorded locally and kick
/// off the archive pipeline for each. Per-channel failures are logged; a
/// missing platform source is a configuration error and fails the job.
pub(crate) async fn check_channels(deps: Arc<Deps>, _args: serde_json::Value) -> WorkerResult<()> {
    let channels = deps.store().list_watched_channels().await?;
    for channel in channels {
        let source = deps.source(channel.platform)?;
        if let Err(e) = check_one(&deps, source, &channel).await {
            warn!(channel = %channel.name, "Channel poll failed: {e}");
        }
    }
    Ok(())
}

async fn check_one(
    deps: &Arc<Deps>,
    source: Arc<dyn PlatformSource>,
    channel: &StoredChannel,
) -> WorkerResult<()> {
    let videos = source
        .get_videos(platform_channel_ref(channel), VideoType::Archive)
        .await?;

    let mut new_videos = 0u32;
    for video in videos {
        if deps
            .store()
            .find_video_by_ext_id(&video.id)
            .await?
            .is_some()
        {
            continue;
        }

        let mut record = StoredVideo::new(channel.id, &video.id, &video.title)
            .with_duration(video.duration)
            .with_video_type(video.video_type);
        if let Some(stream_id) = video.stream_id {
            record = record.with_stream_id(stream_id);
        }
        let video_id = record.id;
        deps.store().create_video(record).await?;
        deps.queue()?
            .enqueue(
                kinds::DOWNLOAD_VIDEO,
                serde_json::to_value(VideoJobArgs { video_id })?,
            )
            .await?;
        new_videos += 1;
    }

    if new_videos > 0 {
        info!(channel = %channel.name, new_videos, "Queued new videos for archiving");
    }
    Ok(())
}
