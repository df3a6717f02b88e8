//! The platform source contract.
//!
//! One trait normalizes heterogeneous streaming-platform APIs. Variants
//! implement the subset of capabilities their platform exposes; every
//! unsupported capability fails with [`PlatformError::NotImplemented`] so
//! callers can branch on capability instead of guessing from empty data.

use async_trait::async_trait;

use vodarc_models::{
    Badge, Category, ChannelInfo, ChatPage, Emote, LiveStreamInfo, Platform, VideoInfo, VideoType,
};

use crate::error::{PlatformError, PlatformResult};

/// Normalized access to one streaming platform.
#[async_trait]
pub trait PlatformSource: Send + Sync {
    /// The platform this source talks to.
    fn platform(&self) -> Platform;

    /// Exchange client credentials for a bearer token and cache it.
    ///
    /// The token is cached process-wide keyed by platform; subsequent calls
    /// reuse it until the caller explicitly re-authenticates. Expiry is the
    /// caller's responsibility.
    async fn authenticate(&self) -> PlatformResult<()>;

    /// Fetch one video by platform id, optionally resolving chapters and
    /// muted segments through platform side-channels.
    async fn get_video(
        &self,
        id: &str,
        with_chapters: bool,
        with_muted_segments: bool,
    ) -> PlatformResult<VideoInfo>;

    /// Fetch the live stream of a channel, or `NotFound` when offline.
    async fn get_live_stream(&self, channel: &str) -> PlatformResult<LiveStreamInfo> {
        let _ = channel;
        Err(PlatformError::not_implemented(
            self.platform(),
            "live stream lookup",
        ))
    }

    /// Fetch live streams for a set of channels; offline channels are
    /// omitted from the result.
    async fn get_live_streams(&self, channels: &[String]) -> PlatformResult<Vec<LiveStreamInfo>> {
        let _ = channels;
        Err(PlatformError::not_implemented(
            self.platform(),
            "batch live stream lookup",
        ))
    }

    /// Fetch a channel by login/slug.
    async fn get_channel(&self, name: &str) -> PlatformResult<ChannelInfo>;

    /// Fetch all videos of a channel with the given type, following
    /// pagination to exhaustion.
    async fn get_videos(
        &self,
        channel_id: &str,
        video_type: VideoType,
    ) -> PlatformResult<Vec<VideoInfo>>;

    /// Fetch top categories.
    async fn get_categories(&self) -> PlatformResult<Vec<Category>> {
        Err(PlatformError::not_implemented(self.platform(), "categories"))
    }

    /// Fetch global chat badges.
    async fn get_global_badges(&self) -> PlatformResult<Vec<Badge>> {
        Err(PlatformError::not_implemented(
            self.platform(),
            "global badges",
        ))
    }

    /// Fetch channel chat badges.
    async fn get_channel_badges(&self, channel_id: &str) -> PlatformResult<Vec<Badge>> {
        let _ = channel_id;
        Err(PlatformError::not_implemented(
            self.platform(),
            "channel badges",
        ))
    }

    /// Fetch global emotes.
    async fn get_global_emotes(&self) -> PlatformResult<Vec<Emote>> {
        Err(PlatformError::not_implemented(
            self.platform(),
            "global emotes",
        ))
    }

    /// Fetch channel emotes.
    async fn get_channel_emotes(&self, channel_id: &str) -> PlatformResult<Vec<Emote>> {
        let _ = channel_id;
        Err(PlatformError::not_implemented(
            self.platform(),
            "channel emotes",
        ))
    }

    /// Fetch one page of chat history for a chat source id.
    ///
    /// The cursor is an opaque string; pass the previous page's cursor to
    /// advance, and an empty cursor means no further pages.
    async fn get_chat_page(&self, chat_source_id: &str, cursor: &str) -> PlatformResult<ChatPage> {
        let _ = (chat_source_id, cursor);
        Err(PlatformError::not_implemented(
            self.platform(),
            "chat history",
        ))
    }
}
