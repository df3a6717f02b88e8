//! Locally stored archive records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vodarc_models::{Platform, VideoType};

/// Unique identifier for a locally stored channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelUid(pub Uuid);

impl ChannelUid {
    /// Generate a new random channel id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a locally stored video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoUid(pub Uuid);

impl VideoUid {
    /// Generate a new random video id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VideoUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A channel tracked by the archiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChannel {
    pub id: ChannelUid,
    /// Platform channel id
    pub ext_id: String,
    /// Login/slug on the platform
    pub name: String,
    /// Human-facing display name
    pub display_name: String,
    /// Platform the channel lives on
    pub platform: Platform,
    /// Whether periodic channel polling watches this channel
    pub watched: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredChannel {
    /// Create a watched channel record.
    pub fn new(platform: Platform, ext_id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: ChannelUid::new(),
            ext_id: ext_id.into(),
            display_name: name.clone(),
            name,
            platform,
            watched: true,
            created_at: Utc::now(),
        }
    }
}

/// A locally archived (or in-flight) video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVideo {
    pub id: VideoUid,
    /// Platform video id; for live recordings this starts as a placeholder
    /// until identity reconciliation resolves the permanent VOD id
    pub ext_id: String,
    /// Platform id of the live stream this video was recorded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_stream_id: Option<String>,
    /// Owning channel
    pub channel_id: ChannelUid,
    pub title: String,
    /// Duration in whole seconds
    pub duration: u32,
    pub video_type: VideoType,
    /// True while an archive pipeline is still running for this video
    pub processing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredVideo {
    /// Create a video record in the processing state.
    pub fn new(channel_id: ChannelUid, ext_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoUid::new(),
            ext_id: ext_id.into(),
            ext_stream_id: None,
            channel_id,
            title: title.into(),
            duration: 0,
            video_type: VideoType::Archive,
            processing: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the source stream id.
    pub fn with_stream_id(mut self, stream_id: impl Into<String>) -> Self {
        self.ext_stream_id = Some(stream_id.into());
        self
    }

    /// Set the video type.
    pub fn with_video_type(mut self, video_type: VideoType) -> Self {
        self.video_type = video_type;
        self
    }

    /// Set the duration in seconds.
    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    /// Mark the archive pipeline finished.
    pub fn with_processing(mut self, processing: bool) -> Self {
        self.processing = processing;
        self
    }
}

/// A stored chapter row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChapter {
    pub id: Uuid,
    pub video_id: VideoUid,
    /// Platform chapter id
    pub ext_id: String,
    /// Platform chapter kind
    pub kind: String,
    pub title: String,
    /// Start offset in seconds
    pub start: u32,
    /// End offset in seconds
    pub end: u32,
}

/// A stored muted-segment row, as a start/end pair in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMutedSegment {
    pub id: Uuid,
    pub video_id: VideoUid,
    pub start: u32,
    pub end: u32,
}
