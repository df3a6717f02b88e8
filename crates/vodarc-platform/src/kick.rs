//! Kick platform source.
//!
//! Covers channel/live-stream/video lookups and cursor-paginated chat
//! history replay. Kick has no public category, badge or emote endpoints,
//! so those capabilities fail with `NotImplemented`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::{info, warn};

use vodarc_models::{
    unknown, ChannelInfo, ChatBadge, ChatIdentity, ChatMessage, ChatPage, ChatSender,
    ConnectionInfo, LiveStreamInfo, Platform, VideoInfo, VideoType,
};

use crate::error::{PlatformError, PlatformResult};
use crate::executor::{ExecutorConfig, RequestExecutor};
use crate::source::PlatformSource;
use crate::token::TokenCache;

/// Kick source configuration.
#[derive(Debug, Clone)]
pub struct KickConfig {
    /// Client credentials for the client-credentials grant
    pub connection: ConnectionInfo,
    /// Site API base URL
    pub api_url: String,
    /// OAuth token endpoint
    pub auth_url: String,
    /// Request executor policy
    pub executor: ExecutorConfig,
}

impl KickConfig {
    /// Config for the production Kick endpoints.
    pub fn new(connection: ConnectionInfo) -> Self {
        Self {
            connection,
            api_url: "https://kick.com".to_string(),
            auth_url: "https://id.kick.com/oauth/token".to_string(),
            executor: ExecutorConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> PlatformResult<Self> {
        let client_id = std::env::var("KICK_CLIENT_ID")
            .map_err(|_| PlatformError::auth_failed("KICK_CLIENT_ID must be set"))?;
        let client_secret = std::env::var("KICK_CLIENT_SECRET")
            .map_err(|_| PlatformError::auth_failed("KICK_CLIENT_SECRET must be set"))?;

        let mut config = Self::new(ConnectionInfo::new(client_id, client_secret));
        if let Ok(url) = std::env::var("KICK_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var("KICK_AUTH_URL") {
            config.auth_url = url;
        }
        Ok(config)
    }
}

/// Kick platform source.
pub struct KickSource {
    config: KickConfig,
    api: RequestExecutor,
    auth: RequestExecutor,
    tokens: Arc<TokenCache>,
}

impl KickSource {
    /// Create a new Kick source sharing the process token cache.
    pub fn new(config: KickConfig, tokens: Arc<TokenCache>) -> PlatformResult<Self> {
        let api = RequestExecutor::new(
            Platform::Kick,
            ExecutorConfig {
                base_url: config.api_url.clone(),
                ..config.executor.clone()
            },
            Arc::clone(&tokens),
        )?;
        let auth = RequestExecutor::new(
            Platform::Kick,
            ExecutorConfig {
                base_url: config.auth_url.clone(),
                send_bearer: false,
                ..config.executor.clone()
            },
            Arc::clone(&tokens),
        )?;

        Ok(Self {
            config,
            api,
            auth,
            tokens,
        })
    }

    async fn fetch_channel(&self, slug: &str) -> PlatformResult<KickChannel> {
        let path = format!("/api/v2/channels/{slug}");
        let bytes = self
            .api
            .execute(Method::GET, &path, &[], &[])
            .await
            .map_err(|e| {
                if e.has_status(404) {
                    PlatformError::not_found(format!("channel {slug}"))
                } else {
                    e
                }
            })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl PlatformSource for KickSource {
    fn platform(&self) -> Platform {
        Platform::Kick
    }

    async fn authenticate(&self) -> PlatformResult<()> {
        let form = [
            ("client_id", self.config.connection.client_id.clone()),
            ("client_secret", self.config.connection.client_secret.clone()),
            ("grant_type", "client_credentials".to_string()),
        ];
        let bytes = self
            .auth
            .execute_form(Method::POST, "", &form, &[])
            .await
            .map_err(|e| match e {
                PlatformError::UnexpectedStatus { status, body } => PlatformError::auth_failed(
                    format!("token exchange returned {status}: {body}"),
                ),
                other => other,
            })?;
        let response: TokenResponse = serde_json::from_slice(&bytes)?;
        self.tokens.set(Platform::Kick, response.access_token).await;
        info!(expires_in = response.expires_in, "Authenticated with Kick");
        Ok(())
    }

    async fn get_video(
        &self,
        id: &str,
        _with_chapters: bool,
        _with_muted_segments: bool,
    ) -> PlatformResult<VideoInfo> {
        // Kick has no chapter/muted-segment side-channel; those fields stay
        // empty on the normalized snapshot.
        let path = format!("/api/v2/video/{id}");
        let bytes = self
            .api
            .execute(Method::GET, &path, &[], &[])
            .await
            .map_err(|e| {
                if e.has_status(404) {
                    PlatformError::not_found(format!("video {id}"))
                } else {
                    e
                }
            })?;
        let video: KickVideoDetail = serde_json::from_slice(&bytes)?;
        Ok(normalize_video_detail(video))
    }

    async fn get_live_stream(&self, channel: &str) -> PlatformResult<LiveStreamInfo> {
        let info = self.fetch_channel(channel).await?;
        let channel_id = info.id;
        info.livestream
            .map(|live| normalize_livestream(live, channel_id, channel))
            .ok_or_else(|| PlatformError::not_found(format!("live stream for {channel}")))
    }

    async fn get_live_streams(&self, channels: &[String]) -> PlatformResult<Vec<LiveStreamInfo>> {
        // Kick has no batch stream endpoint; offline channels are skipped.
        let mut streams = Vec::new();
        for channel in channels {
            match self.get_live_stream(channel).await {
                Ok(stream) => streams.push(stream),
                Err(PlatformError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(streams)
    }

    async fn get_channel(&self, name: &str) -> PlatformResult<ChannelInfo> {
        let channel = self.fetch_channel(name).await?;
        Ok(normalize_channel(channel))
    }

    async fn get_videos(
        &self,
        channel_id: &str,
        video_type: VideoType,
    ) -> PlatformResult<Vec<VideoInfo>> {
        if !matches!(video_type, VideoType::Archive) {
            // Kick only stores past broadcasts.
            return Ok(Vec::new());
        }
        let path = format!("/api/v2/channels/{channel_id}/videos");
        let bytes = self
            .api
            .execute(Method::GET, &path, &[], &[])
            .await
            .map_err(|e| {
                if e.has_status(404) {
                    PlatformError::not_found(format!("channel {channel_id}"))
                } else {
                    e
                }
            })?;
        let videos: Vec<KickChannelVideo> = serde_json::from_slice(&bytes)?;
        Ok(videos
            .into_iter()
            .map(|v| normalize_channel_video(v, channel_id))
            .collect())
    }

    async fn get_chat_page(&self, chat_source_id: &str, cursor: &str) -> PlatformResult<ChatPage> {
        let path = format!("/api/v2/channels/{chat_source_id}/messages");
        let params = [("cursor", cursor.to_string())];
        let bytes = self.api.execute(Method::GET, &path, &params, &[]).await?;
        let response: KickChatResponse = serde_json::from_slice(&bytes)?;

        let messages = response
            .data
            .messages
            .into_iter()
            .map(normalize_chat_message)
            .collect();
        Ok(ChatPage {
            messages,
            cursor: response.data.cursor,
        })
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: String,
}

#[derive(Debug, Deserialize)]
struct KickChannel {
    id: i64,
    slug: String,
    #[serde(default)]
    user: KickUser,
    #[serde(default)]
    livestream: Option<KickLivestream>,
}

#[derive(Debug, Default, Deserialize)]
struct KickUser {
    #[serde(default)]
    username: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    profile_pic: String,
}

#[derive(Debug, Deserialize)]
struct KickLivestream {
    id: i64,
    #[serde(default)]
    session_title: String,
    #[serde(default)]
    viewer_count: i64,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    thumbnail: Option<KickThumbnail>,
    #[serde(default)]
    categories: Vec<KickCategory>,
}

#[derive(Debug, Deserialize)]
struct KickThumbnail {
    #[serde(default)]
    src: String,
}

#[derive(Debug, Deserialize)]
struct KickCategory {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct KickVideoDetail {
    #[serde(default)]
    uuid: String,
    #[serde(default)]
    live_stream_id: Option<i64>,
    #[serde(default)]
    views: i64,
    /// Duration in milliseconds
    #[serde(default)]
    duration: u64,
    #[serde(default)]
    language: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    thumbnail: Option<KickThumbnail>,
    #[serde(default)]
    livestream: Option<KickVideoLivestream>,
}

#[derive(Debug, Deserialize)]
struct KickVideoLivestream {
    #[serde(default)]
    session_title: String,
    #[serde(default)]
    channel: Option<KickChannelBrief>,
}

#[derive(Debug, Deserialize)]
struct KickChannelBrief {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    slug: String,
}

#[derive(Debug, Deserialize)]
struct KickChannelVideo {
    /// Live stream id the recording came from
    id: i64,
    #[serde(default)]
    session_title: String,
    #[serde(default)]
    channel_id: i64,
    #[serde(default)]
    created_at: String,
    /// Duration in milliseconds
    #[serde(default)]
    duration: u64,
    #[serde(default)]
    language: String,
    #[serde(default)]
    thumbnail: Option<KickThumbnail>,
    #[serde(default)]
    video: Option<KickVideoRef>,
}

#[derive(Debug, Deserialize)]
struct KickVideoRef {
    #[serde(default)]
    uuid: String,
    #[serde(default)]
    views: i64,
}

#[derive(Debug, Deserialize)]
struct KickChatResponse {
    data: KickChatData,
}

#[derive(Debug, Deserialize)]
struct KickChatData {
    #[serde(default = "Vec::new")]
    messages: Vec<KickChatMessage>,
    #[serde(default)]
    cursor: String,
}

#[derive(Debug, Deserialize)]
struct KickChatMessage {
    id: String,
    #[serde(default)]
    chat_id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    content: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    metadata: serde_json::Value,
    #[serde(default)]
    sender: Option<KickChatSender>,
    #[serde(default)]
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct KickChatSender {
    #[serde(default)]
    id: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    identity: Option<KickChatIdentity>,
}

#[derive(Debug, Deserialize)]
struct KickChatIdentity {
    #[serde(default)]
    color: String,
    #[serde(default = "Vec::new")]
    badges: Vec<KickChatBadge>,
}

#[derive(Debug, Deserialize)]
struct KickChatBadge {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    count: i64,
}

// =============================================================================
// Normalization
// =============================================================================

/// Parse Kick timestamps, which come as RFC 3339 or "YYYY-MM-DD HH:MM:SS".
fn parse_kick_time(raw: &str) -> DateTime<Utc> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return t.with_timezone(&Utc);
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return t.and_utc();
    }
    if !raw.is_empty() {
        warn!(raw, "Unparseable Kick timestamp");
    }
    DateTime::UNIX_EPOCH
}

fn or_unknown(value: String) -> String {
    if value.is_empty() {
        unknown()
    } else {
        value
    }
}

fn normalize_channel(c: KickChannel) -> ChannelInfo {
    ChannelInfo {
        id: c.id.to_string(),
        login: c.slug.clone(),
        display_name: or_unknown(c.user.username),
        description: or_unknown(c.user.bio),
        profile_image_url: or_unknown(c.user.profile_pic),
        created_at: None,
    }
}

fn normalize_livestream(live: KickLivestream, channel_id: i64, channel: &str) -> LiveStreamInfo {
    let category = live
        .categories
        .into_iter()
        .next()
        .map(|c| c.name)
        .unwrap_or_default();
    LiveStreamInfo {
        id: live.id.to_string(),
        channel_id: channel_id.to_string(),
        channel_login: channel.to_string(),
        title: or_unknown(live.session_title),
        category: or_unknown(category),
        viewer_count: live.viewer_count,
        started_at: parse_kick_time(&live.created_at),
        thumbnail_url: or_unknown(live.thumbnail.map(|t| t.src).unwrap_or_default()),
        language: or_unknown(live.language),
    }
}

fn normalize_video_detail(v: KickVideoDetail) -> VideoInfo {
    let (title, channel_id, channel_login) = match v.livestream {
        Some(live) => {
            let (id, slug) = live
                .channel
                .map(|c| (c.id.to_string(), c.slug))
                .unwrap_or_default();
            (live.session_title, id, slug)
        }
        None => Default::default(),
    };
    let url = if channel_login.is_empty() {
        unknown()
    } else {
        format!("https://kick.com/{channel_login}/videos/{}", v.uuid)
    };
    VideoInfo {
        id: v.uuid,
        stream_id: v.live_stream_id.map(|id| id.to_string()),
        channel_id: or_unknown(channel_id),
        channel_login: or_unknown(channel_login),
        title: or_unknown(title),
        description: unknown(),
        created_at: parse_kick_time(&v.created_at),
        url,
        thumbnail_url: or_unknown(v.thumbnail.map(|t| t.src).unwrap_or_default()),
        view_count: v.views,
        language: or_unknown(v.language),
        video_type: VideoType::Archive,
        duration: (v.duration / 1000) as u32,
        chapters: Vec::new(),
        muted_segments: Vec::new(),
    }
}

fn normalize_channel_video(v: KickChannelVideo, channel_login: &str) -> VideoInfo {
    let (uuid, views) = v.video.map(|r| (r.uuid, r.views)).unwrap_or_default();
    let url = format!("https://kick.com/{channel_login}/videos/{uuid}");
    VideoInfo {
        id: or_unknown(uuid),
        stream_id: Some(v.id.to_string()),
        channel_id: v.channel_id.to_string(),
        channel_login: channel_login.to_string(),
        title: or_unknown(v.session_title),
        description: unknown(),
        created_at: parse_kick_time(&v.created_at),
        url,
        thumbnail_url: or_unknown(v.thumbnail.map(|t| t.src).unwrap_or_default()),
        view_count: views,
        language: or_unknown(v.language),
        video_type: VideoType::Archive,
        duration: (v.duration / 1000) as u32,
        chapters: Vec::new(),
        muted_segments: Vec::new(),
    }
}

fn normalize_chat_message(m: KickChatMessage) -> ChatMessage {
    let sender = m.sender.unwrap_or_else(|| KickChatSender {
        id: String::new(),
        slug: String::new(),
        username: String::new(),
        identity: None,
    });
    let identity = sender.identity.unwrap_or_else(|| KickChatIdentity {
        color: String::new(),
        badges: Vec::new(),
    });
    ChatMessage {
        id: m.id,
        chat_id: or_unknown(m.chat_id),
        user_id: or_unknown(m.user_id),
        content: m.content,
        kind: or_unknown(m.kind),
        metadata: m.metadata,
        sender: ChatSender {
            id: or_unknown(sender.id),
            slug: or_unknown(sender.slug),
            username: or_unknown(sender.username),
            identity: ChatIdentity {
                color: or_unknown(identity.color),
                badges: identity
                    .badges
                    .into_iter()
                    .map(|b| ChatBadge {
                        kind: b.kind,
                        text: b.text,
                        count: b.count,
                    })
                    .collect(),
            },
        },
        created_at: parse_kick_time(&m.created_at),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_source(server: &MockServer) -> KickSource {
        let mut config = KickConfig::new(ConnectionInfo::new("cid", "secret"));
        config.api_url = server.uri();
        config.auth_url = format!("{}/oauth/token", server.uri());
        config.executor.retry_delay = Duration::from_millis(1);
        KickSource::new(config, Arc::new(TokenCache::new())).expect("build source")
    }

    #[test]
    fn parses_kick_timestamps() {
        assert_eq!(
            parse_kick_time("2024-03-01T12:00:00Z").timestamp(),
            1_709_294_400
        );
        assert_eq!(
            parse_kick_time("2024-03-01 12:00:00").timestamp(),
            1_709_294_400
        );
        assert_eq!(parse_kick_time("garbage"), DateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn authenticate_posts_form_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "kick-tok",
                "expires_in": 7200,
                "token_type": "Bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = test_source(&server);
        source.authenticate().await.expect("authenticate succeeds");
        assert_eq!(
            source.tokens.get(Platform::Kick).await.as_deref(),
            Some("kick-tok")
        );
    }

    #[tokio::test]
    async fn get_channel_normalizes_with_sentinels() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/channels/somestreamer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 77,
                "slug": "somestreamer",
                "user": {"username": "SomeStreamer", "bio": "", "profile_pic": ""},
                "livestream": null,
            })))
            .mount(&server)
            .await;

        let source = test_source(&server);
        let channel = source
            .get_channel("somestreamer")
            .await
            .expect("channel resolves");
        assert_eq!(channel.id, "77");
        assert_eq!(channel.login, "somestreamer");
        assert_eq!(channel.description, "unknown");
        assert_eq!(channel.profile_image_url, "unknown");
    }

    #[tokio::test]
    async fn offline_channel_has_no_live_stream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/channels/sleepy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 5,
                "slug": "sleepy",
                "user": {"username": "Sleepy"},
                "livestream": null,
            })))
            .mount(&server)
            .await;

        let source = test_source(&server);
        let err = source
            .get_live_stream("sleepy")
            .await
            .expect_err("offline channel");
        assert!(matches!(err, PlatformError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_videos_converts_milliseconds_to_seconds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/channels/somestreamer/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 900,
                    "session_title": "speedrun",
                    "channel_id": 77,
                    "created_at": "2024-03-01 10:00:00",
                    "duration": 5_400_000u64,
                    "language": "English",
                    "thumbnail": {"src": "https://example.com/t.jpg"},
                    "video": {"uuid": "abc-def", "views": 10},
                },
            ])))
            .mount(&server)
            .await;

        let source = test_source(&server);
        let videos = source
            .get_videos("somestreamer", VideoType::Archive)
            .await
            .expect("listing succeeds");

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, "abc-def");
        assert_eq!(videos[0].stream_id.as_deref(), Some("900"));
        assert_eq!(videos[0].duration, 5400);
        assert_eq!(videos[0].video_type, VideoType::Archive);
    }

    #[tokio::test]
    async fn get_chat_page_maps_messages_and_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/channels/77/messages"))
            .and(query_param("cursor", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "messages": [{
                        "id": "m1",
                        "chat_id": "room-77",
                        "user_id": "u9",
                        "content": "hi",
                        "type": "message",
                        "metadata": {"foo": 1},
                        "sender": {
                            "id": "u9",
                            "slug": "viewer",
                            "username": "Viewer",
                            "identity": {"color": "#abcdef", "badges": [
                                {"type": "moderator", "text": "Moderator", "count": 0},
                            ]},
                        },
                        "created_at": "2024-03-01T10:00:05Z",
                    }],
                    "cursor": "2000",
                },
            })))
            .mount(&server)
            .await;

        let source = test_source(&server);
        let page = source
            .get_chat_page("77", "1000")
            .await
            .expect("chat page resolves");

        assert_eq!(page.cursor, "2000");
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].sender.identity.badges[0].kind, "moderator");
    }

    #[tokio::test]
    async fn categories_are_not_implemented() {
        let server = MockServer::start().await;
        let source = test_source(&server);
        let err = source.get_categories().await.expect_err("no categories");
        assert!(matches!(err, PlatformError::NotImplemented { .. }));
    }
}
