//! Archive pipeline job handlers.
//!
//! Video branch: download → post-process → move. Chat branch: download →
//! render → move. Each stage enqueues its successor on success, so a failed
//! stage retries without repeating completed work.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::BufWriter;
use tracing::info;

use vodarc_models::VideoType;
use vodarc_platform::{export_chat, ChatExportOptions};
use vodarc_store::{StoredChannel, StoredVideo, VideoUid};

use crate::context::Deps;
use crate::error::WorkerResult;
use crate::jobs::{kinds, VideoJobArgs};

fn staging_dir(deps: &Deps, video: &StoredVideo) -> PathBuf {
    deps.config().staging_dir.join(video.id.to_string())
}

fn archive_dir(deps: &Deps, video: &StoredVideo) -> PathBuf {
    deps.config().archive_dir.join(video.id.to_string())
}

async fn load(deps: &Deps, args: serde_json::Value) -> WorkerResult<(StoredVideo, StoredChannel)> {
    let args: VideoJobArgs = serde_json::from_value(args)?;
    let video = deps.store().get_video(args.video_id).await?;
    let channel = deps.store().get_channel(video.channel_id).await?;
    Ok((video, channel))
}

async fn enqueue_next(deps: &Deps, kind: &str, video_id: VideoUid) -> WorkerResult<()> {
    let args = serde_json::to_value(VideoJobArgs { video_id })?;
    deps.queue()?.enqueue(kind, args).await?;
    Ok(())
}

/// Download the raw media of a video into the staging directory.
pub(crate) async fn download_video(deps: Arc<Deps>, args: serde_json::Value) -> WorkerResult<()> {
    let (mut video, channel) = load(&deps, args).await?;
    let source = deps.source(channel.platform)?;

    // Live recordings carry a placeholder id until identity reconciliation
    // resolves the permanent VOD; only refresh metadata for real VODs.
    if video.video_type != VideoType::Live {
        let info = source.get_video(&video.ext_id, false, false).await?;
        video.title = info.title;
        video.duration = info.duration;
        video.updated_at = Utc::now();
        deps.store().update_video(video.clone()).await?;
    }

    let dir = staging_dir(&deps, &video);
    tokio::fs::create_dir_all(&dir).await?;
    let dest = dir.join("raw.mp4");
    deps.media()?.download_video(&video.ext_id, &dest).await?;

    info!(video = %video.id, ext_id = %video.ext_id, "Video downloaded");
    enqueue_next(&deps, kinds::POSTPROCESS_VIDEO, video.id).await
}

/// Post-process downloaded media into its final container.
pub(crate) async fn postprocess_video(
    deps: Arc<Deps>,
    args: serde_json::Value,
) -> WorkerResult<()> {
    let (video, _) = load(&deps, args).await?;
    let dir = staging_dir(&deps, &video);
    deps.media()?
        .postprocess_video(&dir.join("raw.mp4"), &dir.join("video.mp4"))
        .await?;

    info!(video = %video.id, "Video post-processed");
    enqueue_next(&deps, kinds::MOVE_VIDEO, video.id).await
}

/// Move the processed video into the archive and close out the pipeline.
pub(crate) async fn move_video(deps: Arc<Deps>, args: serde_json::Value) -> WorkerResult<()> {
    let (mut video, _) = load(&deps, args).await?;
    let dest_dir = archive_dir(&deps, &video);
    tokio::fs::create_dir_all(&dest_dir).await?;
    tokio::fs::rename(
        staging_dir(&deps, &video).join("video.mp4"),
        dest_dir.join("video.mp4"),
    )
    .await?;

    video.processing = false;
    video.updated_at = Utc::now();
    deps.store().update_video(video.clone()).await?;
    info!(video = %video.id, "Video archived");
    Ok(())
}

/// Export the chat window of a video to the staging directory.
///
/// Streams the transcript page-by-page through the windowed exporter;
/// platforms without chat history fail the job as unsupported.
pub(crate) async fn download_chat(deps: Arc<Deps>, args: serde_json::Value) -> WorkerResult<()> {
    let (video, channel) = load(&deps, args).await?;
    let source = deps.source(channel.platform)?;

    let dir = staging_dir(&deps, &video);
    tokio::fs::create_dir_all(&dir).await?;
    let file = tokio::fs::File::create(dir.join("chat.json")).await?;
    let mut sink = BufWriter::new(file);

    let opts = ChatExportOptions {
        start: video.created_at,
        end: video.created_at + chrono::Duration::seconds(video.duration as i64),
        page_delay: deps.config().chat_page_delay,
    };
    let chat_id = channel.ext_id.clone();
    let fetch_source = Arc::clone(&source);
    let written = export_chat(&mut sink, &opts, move |cursor| {
        let source = Arc::clone(&fetch_source);
        let chat_id = chat_id.clone();
        async move { source.get_chat_page(&chat_id, &cursor).await }
    })
    .await?;

    info!(video = %video.id, messages = written, "Chat transcript exported");
    enqueue_next(&deps, kinds::RENDER_CHAT, video.id).await
}

/// Render the exported transcript into a chat overlay.
pub(crate) async fn render_chat(deps: Arc<Deps>, args: serde_json::Value) -> WorkerResult<()> {
    let (video, _) = load(&deps, args).await?;
    let dir = staging_dir(&deps, &video);
    deps.media()?
        .render_chat(&dir.join("chat.json"), &dir.join("chat.mp4"))
        .await?;

    info!(video = %video.id, "Chat rendered");
    enqueue_next(&deps, kinds::MOVE_CHAT, video.id).await
}

/// Move the chat artifacts into the archive.
pub(crate) async fn move_chat(deps: Arc<Deps>, args: serde_json::Value) -> WorkerResult<()> {
    let (video, _) = load(&deps, args).await?;
    let src_dir = staging_dir(&deps, &video);
    let dest_dir = archive_dir(&deps, &video);
    tokio::fs::create_dir_all(&dest_dir).await?;
    tokio::fs::rename(src_dir.join("chat.json"), dest_dir.join("chat.json")).await?;
    tokio::fs::rename(src_dir.join("chat.mp4"), dest_dir.join("chat.mp4")).await?;

    info!(video = %video.id, "Chat archived");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration as ChronoDuration;

    use vodarc_models::{ChatPage, Platform};
    use vodarc_store::ArchiveStore;

    use crate::error::WorkerError;
    use crate::jobs::queues;
    use crate::testing::{chat_message, deps_with, test_config, FakeSource};

    async fn seed(
        store: &Arc<vodarc_store::MemoryStore>,
        video: StoredVideo,
    ) -> (StoredVideo, StoredChannel) {
        let channel = StoredChannel::new(Platform::Twitch, "123", "streamer");
        store.create_channel(channel.clone()).await.expect("create channel");
        let video = StoredVideo {
            channel_id: channel.id,
            ..video
        };
        store.create_video(video.clone()).await.expect("create video");
        (video, channel)
    }

    fn args(video: &StoredVideo) -> serde_json::Value {
        serde_json::to_value(VideoJobArgs { video_id: video.id }).expect("encode args")
    }

    #[tokio::test]
    async fn move_video_archives_and_clears_processing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let (deps, store, _queue) =
            deps_with(Arc::new(FakeSource::default()), test_config(tmp.path()));
        let (video, _) = seed(
            &store,
            StoredVideo::new(vodarc_store::ChannelUid::new(), "v1", "broadcast"),
        )
        .await;

        let staging = staging_dir(&deps, &video);
        tokio::fs::create_dir_all(&staging).await.expect("mkdir");
        tokio::fs::write(staging.join("video.mp4"), b"media")
            .await
            .expect("write staged media");

        move_video(Arc::clone(&deps), args(&video))
            .await
            .expect("move succeeds");

        let archived = archive_dir(&deps, &video).join("video.mp4");
        assert!(archived.exists());
        let reloaded = store.get_video(video.id).await.expect("get video");
        assert!(!reloaded.processing);
    }

    #[tokio::test]
    async fn download_chat_writes_a_valid_transcript_and_queues_rendering() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let video = StoredVideo::new(vodarc_store::ChannelUid::new(), "v1", "broadcast")
            .with_duration(3600);
        let within = video.created_at + ChronoDuration::seconds(5);
        let source = Arc::new(FakeSource::with_chat_pages(vec![ChatPage {
            messages: vec![chat_message("m1", within), chat_message("m2", within)],
            cursor: String::new(),
        }]));
        let (deps, store, queue) = deps_with(source, test_config(tmp.path()));
        let (video, _) = seed(&store, video).await;

        download_chat(Arc::clone(&deps), args(&video))
            .await
            .expect("export succeeds");

        let transcript = tokio::fs::read(staging_dir(&deps, &video).join("chat.json"))
            .await
            .expect("transcript written");
        let parsed: Vec<serde_json::Value> =
            serde_json::from_slice(&transcript).expect("valid JSON array");
        assert_eq!(parsed.len(), 2);
        assert_eq!(queue.len(queues::CHAT_RENDER).await, 1);
    }

    #[tokio::test]
    async fn download_without_media_runner_is_a_dependency_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let (deps, store, _queue) =
            deps_with(Arc::new(FakeSource::default()), test_config(tmp.path()));
        // A live recording skips the metadata refresh and goes straight to
        // the media runner, which is not configured here.
        let (video, _) = seed(
            &store,
            StoredVideo::new(vodarc_store::ChannelUid::new(), "live-1", "live")
                .with_video_type(VideoType::Live),
        )
        .await;

        let err = download_video(Arc::clone(&deps), args(&video))
            .await
            .expect_err("no media runner configured");
        assert!(matches!(err, WorkerError::DependencyMissing(_)));
    }
}
