//! Normalized channel, live-stream and category snapshots.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Normalized channel snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChannelInfo {
    /// Platform channel id
    pub id: String,
    /// Login/slug used in URLs
    pub login: String,
    /// Human-facing display name
    pub display_name: String,
    /// Channel description
    pub description: String,
    /// Profile image URL
    pub profile_image_url: String,
    /// When the channel was created, when the platform reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Normalized live-stream snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LiveStreamInfo {
    /// Platform stream id (becomes `VideoInfo::stream_id` on the VOD)
    pub id: String,
    /// Platform id of the broadcasting channel
    pub channel_id: String,
    /// Login/slug of the broadcasting channel
    pub channel_login: String,
    /// Stream title
    pub title: String,
    /// Category/game currently streamed
    pub category: String,
    /// Viewer count at fetch time
    pub viewer_count: i64,
    /// When the broadcast started
    pub started_at: DateTime<Utc>,
    /// Thumbnail URL template
    pub thumbnail_url: String,
    /// Language tag
    pub language: String,
}

/// Normalized category/game snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    /// Platform category id
    pub id: String,
    /// Category name
    pub name: String,
    /// Box-art URL template
    pub box_art_url: String,
}
