//! Shared data models for the vodarc archiver.
//!
//! This crate provides Serde-serializable types for:
//! - Platform identities and credentials
//! - Normalized video/channel/live-stream snapshots
//! - Chapters and muted segments
//! - Chat messages and pagination envelopes

pub mod channel;
pub mod chat;
pub mod platform;
pub mod video;

// Re-export common types
pub use channel::{Category, ChannelInfo, LiveStreamInfo};
pub use chat::{Badge, ChatBadge, ChatIdentity, ChatMessage, ChatPage, ChatSender, Emote};
pub use platform::{ConnectionInfo, Platform};
pub use video::{Chapter, MutedSegment, VideoInfo, VideoType};

/// Sentinel filled into normalized fields a platform does not provide.
///
/// Downstream consumers rely on fields never being empty, so adapters
/// substitute this value instead of leaving gaps.
pub const UNKNOWN: &str = "unknown";

/// Convenience constructor for sentinel-valued fields.
pub fn unknown() -> String {
    UNKNOWN.to_string()
}
