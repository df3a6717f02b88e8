//! The archive store contract.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{ChannelUid, StoredChannel, StoredChapter, StoredMutedSegment, StoredVideo, VideoUid};

/// Opaque persistent store for archive records.
///
/// Implementations must support safe concurrent access from multiple
/// workers; the archiver performs no locking above this surface beyond the
/// idempotency guards of the reconciliation jobs.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Cheap liveness probe used by the watchdog.
    async fn ping(&self) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Channels
    // -------------------------------------------------------------------------

    /// List channels flagged for periodic polling.
    async fn list_watched_channels(&self) -> StoreResult<Vec<StoredChannel>>;

    /// Get a channel by id.
    async fn get_channel(&self, id: ChannelUid) -> StoreResult<StoredChannel>;

    /// Create a channel; fails with `Conflict` when the id exists.
    async fn create_channel(&self, channel: StoredChannel) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Videos
    // -------------------------------------------------------------------------

    /// Get a video by id.
    async fn get_video(&self, id: VideoUid) -> StoreResult<StoredVideo>;

    /// Find a video by its platform id, if recorded.
    async fn find_video_by_ext_id(&self, ext_id: &str) -> StoreResult<Option<StoredVideo>>;

    /// List all videos of a channel.
    async fn list_videos_by_channel(&self, channel_id: ChannelUid) -> StoreResult<Vec<StoredVideo>>;

    /// List archived videos eligible for chapter backfill: externally
    /// identified, not live, not mid-pipeline, and without stored chapters.
    async fn list_videos_missing_chapters(&self) -> StoreResult<Vec<StoredVideo>>;

    /// List a channel's videos still tagged as live that carry a known
    /// stream id, i.e. candidates for VOD identity reconciliation.
    async fn list_live_tagged_videos(&self, channel_id: ChannelUid)
        -> StoreResult<Vec<StoredVideo>>;

    /// Create a video; fails with `Conflict` when the id exists.
    async fn create_video(&self, video: StoredVideo) -> StoreResult<()>;

    /// Replace a video record.
    async fn update_video(&self, video: StoredVideo) -> StoreResult<()>;

    /// Point a video at a new platform id (VOD identity reconciliation).
    async fn update_video_ext_id(&self, id: VideoUid, ext_id: &str) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Chapters and muted segments
    // -------------------------------------------------------------------------

    /// List the stored chapters of a video.
    async fn list_chapters(&self, video_id: VideoUid) -> StoreResult<Vec<StoredChapter>>;

    /// Insert a batch of chapters for a video.
    async fn insert_chapters(
        &self,
        video_id: VideoUid,
        chapters: Vec<StoredChapter>,
    ) -> StoreResult<()>;

    /// List the stored muted segments of a video.
    async fn list_muted_segments(&self, video_id: VideoUid)
        -> StoreResult<Vec<StoredMutedSegment>>;

    /// Insert a batch of muted segments for a video.
    async fn insert_muted_segments(
        &self,
        video_id: VideoUid,
        segments: Vec<StoredMutedSegment>,
    ) -> StoreResult<()>;
}
