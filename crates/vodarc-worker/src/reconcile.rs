//! Live-to-VOD identity reconciliation.

use std::sync::Arc;

use tracing::{info, warn};

use vodarc_models::VideoType;
use vodarc_platform::PlatformSource;
use vodarc_store::StoredChannel;

use crate::channels::platform_channel_ref;
use crate::context::Deps;
use crate::error::WorkerResult;

/// Repair the external ids of videos recorded while live.
///
/// A live recording starts under the stream id; once the platform publishes
/// the permanent VOD, the first archive-type platform video with a matching
/// stream id supplies the real id.
pub(crate) async fn reconcile_vod_ids(deps: Arc<Deps>, _args: serde_json::Value) -> WorkerResult<()> {
    let channels = deps.store().list_watched_channels().await?;
    for channel in channels {
        let source = deps.source(channel.platform)?;
        if let Err(e) = reconcile_channel(&deps, source, &channel).await {
            warn!(channel = %channel.name, "Identity reconciliation failed: {e}");
        }
    }
    Ok(())
}

async fn reconcile_channel(
    deps: &Arc<Deps>,
    source: Arc<dyn PlatformSource>,
    channel: &StoredChannel,
) -> WorkerResult<()> {
    let local = deps.store().list_live_tagged_videos(channel.id).await?;
    if local.is_empty() {
        return Ok(());
    }

    let platform_videos = source
        .get_videos(platform_channel_ref(channel), VideoType::Archive)
        .await?;

    for video in local {
        let stream_id = match video.ext_stream_id.as_deref() {
            Some(id) => id,
            None => continue,
        };
        // First match wins; later duplicates are ignored.
        if let Some(found) = platform_videos
            .iter()
            .find(|pv| pv.stream_id.as_deref() == Some(stream_id))
        {
            info!(
                video = %video.id,
                stream_id,
                vod_id = %found.id,
                "Resolved live recording to permanent VOD id"
            );
            deps.store().update_video_ext_id(video.id, &found.id).await?;
        }
    }
    Ok(())
}
