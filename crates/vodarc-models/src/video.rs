//! Normalized video snapshots, chapters and muted segments.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of video as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoType {
    /// Past-broadcast recording of a live stream
    #[default]
    Archive,
    /// Creator-curated highlight
    Highlight,
    /// Directly uploaded video
    Upload,
    /// Currently live (no permanent VOD id yet)
    Live,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::Archive => "archive",
            VideoType::Highlight => "highlight",
            VideoType::Upload => "upload",
            VideoType::Live => "live",
        }
    }
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A muted span of a video, in seconds relative to the video start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MutedSegment {
    /// Offset from the start of the video
    pub offset: u32,
    /// Length of the muted span
    pub duration: u32,
}

impl MutedSegment {
    /// Build a segment clipped so `offset + duration` never exceeds the
    /// video duration.
    pub fn clipped(offset: u32, duration: u32, video_duration: u32) -> Self {
        let offset = offset.min(video_duration);
        let duration = duration.min(video_duration.saturating_sub(offset));
        Self { offset, duration }
    }

    /// End of the segment, in seconds from video start.
    pub fn end(&self) -> u32 {
        self.offset + self.duration
    }
}

/// A chapter marker within a video, in seconds relative to the video start.
///
/// Chapters for a video form a contiguous, non-overlapping, ascending
/// sequence: each chapter's `end` equals the next chapter's `start`, and the
/// last chapter's `end` equals the video duration. Use [`Chapter::seal_ends`]
/// to normalize a platform chapter list into that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Chapter {
    /// Platform chapter id
    pub id: String,
    /// Platform chapter kind (e.g. "GAME_CHANGE")
    #[serde(rename = "type")]
    pub kind: String,
    /// Chapter title
    pub title: String,
    /// Start offset in seconds
    pub start: u32,
    /// End offset in seconds
    pub end: u32,
}

impl Chapter {
    /// Normalize a chapter list: sort ascending by start, derive each
    /// chapter's end from the next chapter's start, and pin the last
    /// chapter's end to the video duration.
    pub fn seal_ends(mut chapters: Vec<Chapter>, video_duration: u32) -> Vec<Chapter> {
        chapters.sort_by_key(|c| c.start);
        let starts: Vec<u32> = chapters.iter().skip(1).map(|c| c.start).collect();
        for (i, chapter) in chapters.iter_mut().enumerate() {
            chapter.end = starts.get(i).copied().unwrap_or(video_duration);
        }
        chapters
    }
}

/// Normalized, read-only video snapshot returned by a platform source.
///
/// Fields a platform does not provide are filled with the `"unknown"`
/// sentinel rather than left empty.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoInfo {
    /// Platform video id
    pub id: String,
    /// Id of the live stream this video was recorded from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    /// Platform id of the owning channel
    pub channel_id: String,
    /// Login/slug of the owning channel
    pub channel_login: String,
    /// Video title
    pub title: String,
    /// Video description
    pub description: String,
    /// When the video was created on the platform
    pub created_at: DateTime<Utc>,
    /// Canonical video URL
    pub url: String,
    /// Thumbnail URL template
    pub thumbnail_url: String,
    /// View count at fetch time
    pub view_count: i64,
    /// Language tag
    pub language: String,
    /// Video kind
    pub video_type: VideoType,
    /// Duration in whole seconds
    pub duration: u32,
    /// Chapters, when requested and available
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    /// Muted segments, when requested and available
    #[serde(default)]
    pub muted_segments: Vec<MutedSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(id: &str, start: u32) -> Chapter {
        Chapter {
            id: id.to_string(),
            kind: "GAME_CHANGE".to_string(),
            title: format!("chapter {id}"),
            start,
            end: 0,
        }
    }

    #[test]
    fn seal_ends_makes_chapters_contiguous() {
        let chapters = Chapter::seal_ends(
            vec![chapter("b", 120), chapter("a", 0), chapter("c", 400)],
            900,
        );

        assert_eq!(chapters.len(), 3);
        for pair in chapters.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(chapters.last().unwrap().end, 900);
    }

    #[test]
    fn seal_ends_single_chapter_spans_video() {
        let chapters = Chapter::seal_ends(vec![chapter("a", 0)], 3600);
        assert_eq!(chapters[0].start, 0);
        assert_eq!(chapters[0].end, 3600);
    }

    #[test]
    fn seal_ends_empty_is_empty() {
        assert!(Chapter::seal_ends(Vec::new(), 100).is_empty());
    }

    #[test]
    fn muted_segment_clipped_to_duration() {
        let seg = MutedSegment::clipped(500, 120, 560);
        assert_eq!(seg.offset, 500);
        assert_eq!(seg.duration, 60);
        assert_eq!(seg.end(), 560);
    }

    #[test]
    fn muted_segment_offset_beyond_duration() {
        let seg = MutedSegment::clipped(700, 30, 560);
        assert_eq!(seg.offset, 560);
        assert_eq!(seg.duration, 0);
    }
}
