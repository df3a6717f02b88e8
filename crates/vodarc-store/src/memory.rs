//! In-memory archive store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use vodarc_models::VideoType;

use crate::error::{StoreError, StoreResult};
use crate::store::ArchiveStore;
use crate::types::{ChannelUid, StoredChannel, StoredChapter, StoredMutedSegment, StoredVideo, VideoUid};

#[derive(Debug, Default)]
struct Inner {
    channels: HashMap<ChannelUid, StoredChannel>,
    videos: HashMap<VideoUid, StoredVideo>,
    chapters: HashMap<VideoUid, Vec<StoredChapter>>,
    muted_segments: HashMap<VideoUid, Vec<StoredMutedSegment>>,
}

/// RwLock-backed store used by tests and the default bootstrap.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_creation(mut videos: Vec<StoredVideo>) -> Vec<StoredVideo> {
    videos.sort_by_key(|v| v.created_at);
    videos
}

#[async_trait]
impl ArchiveStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_watched_channels(&self) -> StoreResult<Vec<StoredChannel>> {
        let inner = self.inner.read().await;
        let mut channels: Vec<StoredChannel> = inner
            .channels
            .values()
            .filter(|c| c.watched)
            .cloned()
            .collect();
        channels.sort_by_key(|c| c.created_at);
        Ok(channels)
    }

    async fn get_channel(&self, id: ChannelUid) -> StoreResult<StoredChannel> {
        let inner = self.inner.read().await;
        inner
            .channels
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("channel {id}")))
    }

    async fn create_channel(&self, channel: StoredChannel) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.channels.contains_key(&channel.id) {
            return Err(StoreError::conflict(format!("channel {}", channel.id)));
        }
        debug!(channel = %channel.id, name = %channel.name, "Created channel record");
        inner.channels.insert(channel.id, channel);
        Ok(())
    }

    async fn get_video(&self, id: VideoUid) -> StoreResult<StoredVideo> {
        let inner = self.inner.read().await;
        inner
            .videos
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("video {id}")))
    }

    async fn find_video_by_ext_id(&self, ext_id: &str) -> StoreResult<Option<StoredVideo>> {
        let inner = self.inner.read().await;
        Ok(inner
            .videos
            .values()
            .find(|v| v.ext_id == ext_id)
            .cloned())
    }

    async fn list_videos_by_channel(
        &self,
        channel_id: ChannelUid,
    ) -> StoreResult<Vec<StoredVideo>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_creation(
            inner
                .videos
                .values()
                .filter(|v| v.channel_id == channel_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_videos_missing_chapters(&self) -> StoreResult<Vec<StoredVideo>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_creation(
            inner
                .videos
                .values()
                .filter(|v| {
                    !v.processing
                        && v.video_type != VideoType::Live
                        && !v.ext_id.is_empty()
                        && inner
                            .chapters
                            .get(&v.id)
                            .map(|c| c.is_empty())
                            .unwrap_or(true)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn list_live_tagged_videos(
        &self,
        channel_id: ChannelUid,
    ) -> StoreResult<Vec<StoredVideo>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_creation(
            inner
                .videos
                .values()
                .filter(|v| {
                    v.channel_id == channel_id
                        && v.video_type == VideoType::Live
                        && v.ext_stream_id.is_some()
                })
                .cloned()
                .collect(),
        ))
    }

    async fn create_video(&self, video: StoredVideo) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.videos.contains_key(&video.id) {
            return Err(StoreError::conflict(format!("video {}", video.id)));
        }
        debug!(video = %video.id, ext_id = %video.ext_id, "Created video record");
        inner.videos.insert(video.id, video);
        Ok(())
    }

    async fn update_video(&self, video: StoredVideo) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.videos.contains_key(&video.id) {
            return Err(StoreError::not_found(format!("video {}", video.id)));
        }
        inner.videos.insert(video.id, video);
        Ok(())
    }

    async fn update_video_ext_id(&self, id: VideoUid, ext_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let video = inner
            .videos
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("video {id}")))?;
        video.ext_id = ext_id.to_string();
        video.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn list_chapters(&self, video_id: VideoUid) -> StoreResult<Vec<StoredChapter>> {
        let inner = self.inner.read().await;
        Ok(inner.chapters.get(&video_id).cloned().unwrap_or_default())
    }

    async fn insert_chapters(
        &self,
        video_id: VideoUid,
        chapters: Vec<StoredChapter>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .chapters
            .entry(video_id)
            .or_default()
            .extend(chapters);
        Ok(())
    }

    async fn list_muted_segments(
        &self,
        video_id: VideoUid,
    ) -> StoreResult<Vec<StoredMutedSegment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .muted_segments
            .get(&video_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_muted_segments(
        &self,
        video_id: VideoUid,
        segments: Vec<StoredMutedSegment>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .muted_segments
            .entry(video_id)
            .or_default()
            .extend(segments);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uuid::Uuid;

    #[tokio::test]
    async fn create_video_rejects_duplicate_ids() {
        let store = MemoryStore::new();
        let video = StoredVideo::new(ChannelUid::new(), "v1", "title");
        store.create_video(video.clone()).await.expect("create");

        let err = store.create_video(video).await.expect_err("duplicate id");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_chapters_listing_excludes_processing_and_live() {
        let store = MemoryStore::new();
        let channel = ChannelUid::new();

        let done = StoredVideo::new(channel, "v1", "done").with_processing(false);
        let live = StoredVideo::new(channel, "v2", "live")
            .with_processing(false)
            .with_video_type(VideoType::Live);
        let busy = StoredVideo::new(channel, "v3", "busy");
        let chaptered = StoredVideo::new(channel, "v4", "chaptered").with_processing(false);

        for v in [&done, &live, &busy, &chaptered] {
            store.create_video(v.clone()).await.expect("create");
        }
        store
            .insert_chapters(
                chaptered.id,
                vec![StoredChapter {
                    id: Uuid::new_v4(),
                    video_id: chaptered.id,
                    ext_id: "c1".to_string(),
                    kind: "GAME_CHANGE".to_string(),
                    title: "intro".to_string(),
                    start: 0,
                    end: 60,
                }],
            )
            .await
            .expect("insert chapters");

        let missing = store
            .list_videos_missing_chapters()
            .await
            .expect("listing succeeds");
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, done.id);
    }

    #[tokio::test]
    async fn live_tagged_listing_requires_stream_id() {
        let store = MemoryStore::new();
        let channel = ChannelUid::new();

        let with_stream = StoredVideo::new(channel, "v1", "a")
            .with_video_type(VideoType::Live)
            .with_stream_id("s1");
        let without_stream =
            StoredVideo::new(channel, "v2", "b").with_video_type(VideoType::Live);

        store.create_video(with_stream.clone()).await.expect("create");
        store.create_video(without_stream).await.expect("create");

        let tagged = store
            .list_live_tagged_videos(channel)
            .await
            .expect("listing succeeds");
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id, with_stream.id);
    }

    #[tokio::test]
    async fn update_video_ext_id_changes_identity() {
        let store = MemoryStore::new();
        let video = StoredVideo::new(ChannelUid::new(), "live-placeholder", "t");
        store.create_video(video.clone()).await.expect("create");

        store
            .update_video_ext_id(video.id, "permanent-vod")
            .await
            .expect("update");
        let reloaded = store.get_video(video.id).await.expect("get");
        assert_eq!(reloaded.ext_id, "permanent-vod");
    }
}
