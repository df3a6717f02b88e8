//! Shared fakes for handler tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use vodarc_models::{
    ChannelInfo, ChatIdentity, ChatMessage, ChatPage, ChatSender, Platform, VideoInfo, VideoType,
};
use vodarc_platform::{PlatformError, PlatformResult, PlatformSource, TokenCache};
use vodarc_queue::JobQueue;
use vodarc_store::MemoryStore;

use crate::config::WorkerConfig;
use crate::context::Deps;
use crate::jobs;

/// Platform source serving canned data.
#[derive(Default)]
pub(crate) struct FakeSource {
    pub videos: Mutex<Vec<VideoInfo>>,
    pub chat_pages: Mutex<VecDeque<ChatPage>>,
}

impl FakeSource {
    pub fn with_videos(videos: Vec<VideoInfo>) -> Self {
        Self {
            videos: Mutex::new(videos),
            chat_pages: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_chat_pages(pages: Vec<ChatPage>) -> Self {
        Self {
            videos: Mutex::new(Vec::new()),
            chat_pages: Mutex::new(pages.into()),
        }
    }
}

#[async_trait]
impl PlatformSource for FakeSource {
    fn platform(&self) -> Platform {
        Platform::Twitch
    }

    async fn authenticate(&self) -> PlatformResult<()> {
        Ok(())
    }

    async fn get_video(
        &self,
        id: &str,
        _with_chapters: bool,
        _with_muted_segments: bool,
    ) -> PlatformResult<VideoInfo> {
        self.videos
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("video {id}")))
    }

    async fn get_channel(&self, name: &str) -> PlatformResult<ChannelInfo> {
        Ok(ChannelInfo {
            id: "123".to_string(),
            login: name.to_string(),
            display_name: name.to_string(),
            description: "unknown".to_string(),
            profile_image_url: "unknown".to_string(),
            created_at: None,
        })
    }

    async fn get_videos(
        &self,
        _channel_id: &str,
        _video_type: VideoType,
    ) -> PlatformResult<Vec<VideoInfo>> {
        Ok(self.videos.lock().unwrap().clone())
    }

    async fn get_chat_page(
        &self,
        _chat_source_id: &str,
        _cursor: &str,
    ) -> PlatformResult<ChatPage> {
        Ok(self
            .chat_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub(crate) fn video_info(id: &str, stream_id: Option<&str>, duration: u32) -> VideoInfo {
    VideoInfo {
        id: id.to_string(),
        stream_id: stream_id.map(str::to_string),
        channel_id: "123".to_string(),
        channel_login: "streamer".to_string(),
        title: format!("broadcast {id}"),
        description: "unknown".to_string(),
        created_at: at(1_000),
        url: format!("https://example.com/videos/{id}"),
        thumbnail_url: "unknown".to_string(),
        view_count: 0,
        language: "en".to_string(),
        video_type: VideoType::Archive,
        duration,
        chapters: Vec::new(),
        muted_segments: Vec::new(),
    }
}

pub(crate) fn chat_message(id: &str, created_at: DateTime<Utc>) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        chat_id: "room".to_string(),
        user_id: "u1".to_string(),
        content: format!("msg {id}"),
        kind: "message".to_string(),
        metadata: serde_json::json!({}),
        sender: ChatSender {
            id: "u1".to_string(),
            slug: "viewer".to_string(),
            username: "Viewer".to_string(),
            identity: ChatIdentity {
                color: "#ffffff".to_string(),
                badges: Vec::new(),
            },
        },
        created_at,
    }
}

pub(crate) fn test_config(root: &std::path::Path) -> WorkerConfig {
    WorkerConfig {
        item_delay: std::time::Duration::from_millis(1),
        chat_page_delay: std::time::Duration::from_millis(0),
        staging_dir: root.join("staging"),
        archive_dir: root.join("archive"),
        ..WorkerConfig::default()
    }
}

/// Build a context around a fake source and a fresh in-memory store, with
/// the full job registry attached so handlers can enqueue follow-up work.
pub(crate) fn deps_with(
    source: Arc<FakeSource>,
    config: WorkerConfig,
) -> (Arc<Deps>, Arc<MemoryStore>, Arc<JobQueue<Deps>>) {
    let store = Arc::new(MemoryStore::new());
    let deps = Arc::new(
        Deps::new(
            Arc::clone(&store) as Arc<dyn vodarc_store::ArchiveStore>,
            Arc::new(TokenCache::new()),
            config,
        )
        .with_source(source),
    );

    let mut registry = vodarc_queue::JobRegistry::new();
    jobs::register_all(&mut registry).expect("register jobs");
    let queue = Arc::new(JobQueue::new(Arc::new(registry)));
    deps.attach_queue(Arc::clone(&queue));

    (deps, store, queue)
}
