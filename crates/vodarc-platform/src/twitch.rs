//! Twitch platform source.
//!
//! Talks to the Helix REST API for videos, streams, channels, categories,
//! badges and emotes, and to the non-public GQL endpoint for chapter
//! markers and muted segments, which Helix does not expose.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::info;

use vodarc_models::{
    unknown, Badge, Category, ChannelInfo, Chapter, ConnectionInfo, Emote, LiveStreamInfo,
    MutedSegment, Platform, VideoInfo, VideoType,
};

use crate::error::{PlatformError, PlatformResult};
use crate::executor::{ExecutorConfig, RequestExecutor};
use crate::paginate::{accumulate, Page};
use crate::source::PlatformSource;
use crate::token::TokenCache;

/// Public client id the Twitch web player uses for GQL calls.
const GQL_CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h7ko";

/// Twitch source configuration.
#[derive(Debug, Clone)]
pub struct TwitchConfig {
    /// Client credentials for the client-credentials grant
    pub connection: ConnectionInfo,
    /// Helix API base URL
    pub api_url: String,
    /// OAuth token endpoint
    pub auth_url: String,
    /// GQL endpoint for the chapter/muted-segment side-channel
    pub gql_url: String,
    /// Client id sent on GQL calls
    pub gql_client_id: String,
    /// Request executor policy shared by all endpoints
    pub executor: ExecutorConfig,
}

impl TwitchConfig {
    /// Config for the production Twitch endpoints.
    pub fn new(connection: ConnectionInfo) -> Self {
        Self {
            connection,
            api_url: "https://api.twitch.tv/helix".to_string(),
            auth_url: "https://id.twitch.tv/oauth2/token".to_string(),
            gql_url: "https://gql.twitch.tv/gql".to_string(),
            gql_client_id: GQL_CLIENT_ID.to_string(),
            executor: ExecutorConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> PlatformResult<Self> {
        let client_id = std::env::var("TWITCH_CLIENT_ID")
            .map_err(|_| PlatformError::auth_failed("TWITCH_CLIENT_ID must be set"))?;
        let client_secret = std::env::var("TWITCH_CLIENT_SECRET")
            .map_err(|_| PlatformError::auth_failed("TWITCH_CLIENT_SECRET must be set"))?;

        let mut config = Self::new(ConnectionInfo::new(client_id, client_secret));
        if let Ok(url) = std::env::var("TWITCH_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var("TWITCH_AUTH_URL") {
            config.auth_url = url;
        }
        if let Ok(url) = std::env::var("TWITCH_GQL_URL") {
            config.gql_url = url;
        }
        Ok(config)
    }
}

/// Twitch platform source.
pub struct TwitchSource {
    config: TwitchConfig,
    helix: RequestExecutor,
    auth: RequestExecutor,
    gql: RequestExecutor,
    tokens: Arc<TokenCache>,
}

impl TwitchSource {
    /// Create a new Twitch source sharing the process token cache.
    pub fn new(config: TwitchConfig, tokens: Arc<TokenCache>) -> PlatformResult<Self> {
        let helix = RequestExecutor::new(
            Platform::Twitch,
            ExecutorConfig {
                base_url: config.api_url.clone(),
                ..config.executor.clone()
            },
            Arc::clone(&tokens),
        )?;
        // Token exchange and GQL carry no bearer token.
        let auth = RequestExecutor::new(
            Platform::Twitch,
            ExecutorConfig {
                base_url: config.auth_url.clone(),
                send_bearer: false,
                ..config.executor.clone()
            },
            Arc::clone(&tokens),
        )?;
        let gql = RequestExecutor::new(
            Platform::Twitch,
            ExecutorConfig {
                base_url: config.gql_url.clone(),
                send_bearer: false,
                ..config.executor.clone()
            },
            Arc::clone(&tokens),
        )?;

        Ok(Self {
            config,
            helix,
            auth,
            gql,
            tokens,
        })
    }

    fn helix_headers(&self) -> Vec<(&'static str, String)> {
        vec![("Client-Id", self.config.connection.client_id.clone())]
    }

    async fn helix_get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> PlatformResult<Envelope<T>> {
        let bytes = self
            .helix
            .execute(Method::GET, path, params, &self.helix_headers())
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn gql_video(&self, query: String) -> PlatformResult<Option<GqlVideo>> {
        let body = serde_json::json!({ "query": query });
        let headers = [("Client-ID", self.config.gql_client_id.clone())];
        let bytes = self
            .gql
            .execute_json(Method::POST, "", &body, &headers)
            .await?;
        let response: GqlResponse = serde_json::from_slice(&bytes)?;
        Ok(response.data.and_then(|d| d.video))
    }

    /// Fetch chapter markers for a video through the GQL side-channel,
    /// converting millisecond positions to whole seconds and deriving each
    /// chapter's end from its successor (last end = video duration).
    async fn get_video_chapters(&self, id: &str, duration: u32) -> PlatformResult<Vec<Chapter>> {
        let query = format!(
            "query{{video(id:\"{id}\"){{moments(momentRequestType:VIDEO_CHAPTER_MARKERS)\
             {{edges{{node{{id positionMilliseconds type description}}}}}}}}}}"
        );
        let video = self.gql_video(query).await?;
        let edges = video
            .and_then(|v| v.moments)
            .map(|m| m.edges)
            .unwrap_or_default();

        let chapters = edges
            .into_iter()
            .map(|edge| Chapter {
                id: edge.node.id,
                kind: edge.node.kind,
                title: edge.node.description,
                start: (edge.node.position_milliseconds / 1000) as u32,
                end: 0,
            })
            .collect();
        Ok(Chapter::seal_ends(chapters, duration))
    }

    /// Fetch muted segments for a video through the GQL side-channel,
    /// clipped so no segment extends past the video duration.
    async fn get_video_muted_segments(
        &self,
        id: &str,
        duration: u32,
    ) -> PlatformResult<Vec<MutedSegment>> {
        let query = format!(
            "query{{video(id:\"{id}\"){{muteInfo{{mutedSegmentConnection\
             {{nodes{{offset duration}}}}}}}}}}"
        );
        let video = self.gql_video(query).await?;
        let nodes = video
            .and_then(|v| v.mute_info)
            .and_then(|m| m.muted_segment_connection)
            .map(|c| c.nodes)
            .unwrap_or_default();

        Ok(nodes
            .into_iter()
            .map(|n| MutedSegment::clipped(n.offset, n.duration, duration))
            .collect())
    }
}

#[async_trait]
impl PlatformSource for TwitchSource {
    fn platform(&self) -> Platform {
        Platform::Twitch
    }

    async fn authenticate(&self) -> PlatformResult<()> {
        let params = [
            ("client_id", self.config.connection.client_id.clone()),
            ("client_secret", self.config.connection.client_secret.clone()),
            ("grant_type", "client_credentials".to_string()),
        ];
        let bytes = self
            .auth
            .execute(Method::POST, "", &params, &[])
            .await
            .map_err(|e| match e {
                PlatformError::UnexpectedStatus { status, body } => PlatformError::auth_failed(
                    format!("token exchange returned {status}: {body}"),
                ),
                other => other,
            })?;
        let response: TokenResponse = serde_json::from_slice(&bytes)?;
        self.tokens
            .set(Platform::Twitch, response.access_token)
            .await;
        info!(expires_in = response.expires_in, "Authenticated with Twitch");
        Ok(())
    }

    async fn get_video(
        &self,
        id: &str,
        with_chapters: bool,
        with_muted_segments: bool,
    ) -> PlatformResult<VideoInfo> {
        let params = [("id", id.to_string())];
        let envelope: Envelope<TwitchVideo> = self.helix_get("/videos", &params).await?;
        let video = envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::not_found(format!("video {id}")))?;
        let mut video = normalize_video(video);

        if with_chapters {
            video.chapters = self.get_video_chapters(id, video.duration).await?;
        }
        if with_muted_segments {
            video.muted_segments = self.get_video_muted_segments(id, video.duration).await?;
        }
        Ok(video)
    }

    async fn get_live_stream(&self, channel: &str) -> PlatformResult<LiveStreamInfo> {
        let params = [("user_login", channel.to_string())];
        let envelope: Envelope<TwitchStream> = self.helix_get("/streams", &params).await?;
        envelope
            .data
            .into_iter()
            .next()
            .map(normalize_stream)
            .ok_or_else(|| PlatformError::not_found(format!("live stream for {channel}")))
    }

    async fn get_live_streams(&self, channels: &[String]) -> PlatformResult<Vec<LiveStreamInfo>> {
        let streams = accumulate(|after| async move {
            let mut params: Vec<(&str, String)> = channels
                .iter()
                .map(|c| ("user_login", c.clone()))
                .collect();
            params.push(("first", "100".to_string()));
            if !after.is_empty() {
                params.push(("after", after));
            }
            let envelope: Envelope<TwitchStream> = self.helix_get("/streams", &params).await?;
            Ok(Page {
                items: envelope.data,
                cursor: envelope.pagination.cursor,
            })
        })
        .await?;
        Ok(streams.into_iter().map(normalize_stream).collect())
    }

    async fn get_channel(&self, name: &str) -> PlatformResult<ChannelInfo> {
        let params = [("login", name.to_string())];
        let envelope: Envelope<TwitchUser> = self.helix_get("/users", &params).await?;
        envelope
            .data
            .into_iter()
            .next()
            .map(normalize_user)
            .ok_or_else(|| PlatformError::not_found(format!("channel {name}")))
    }

    async fn get_videos(
        &self,
        channel_id: &str,
        video_type: VideoType,
    ) -> PlatformResult<Vec<VideoInfo>> {
        let type_param = match video_type {
            VideoType::Archive => "archive",
            VideoType::Highlight => "highlight",
            VideoType::Upload => "upload",
            // Live broadcasts have no VOD listing of their own.
            VideoType::Live => "all",
        };
        let videos = accumulate(|after| async move {
            let mut params = vec![
                ("user_id", channel_id.to_string()),
                ("type", type_param.to_string()),
                ("first", "100".to_string()),
            ];
            if !after.is_empty() {
                params.push(("after", after));
            }
            let envelope: Envelope<TwitchVideo> = self.helix_get("/videos", &params).await?;
            Ok(Page {
                items: envelope.data,
                cursor: envelope.pagination.cursor,
            })
        })
        .await?;
        Ok(videos.into_iter().map(normalize_video).collect())
    }

    async fn get_categories(&self) -> PlatformResult<Vec<Category>> {
        let games = accumulate(|after| async move {
            let mut params = vec![("first", "100".to_string())];
            if !after.is_empty() {
                params.push(("after", after));
            }
            let envelope: Envelope<TwitchGame> = self.helix_get("/games/top", &params).await?;
            Ok(Page {
                items: envelope.data,
                cursor: envelope.pagination.cursor,
            })
        })
        .await?;
        Ok(games
            .into_iter()
            .map(|g| Category {
                id: g.id,
                name: g.name,
                box_art_url: g.box_art_url,
            })
            .collect())
    }

    async fn get_global_badges(&self) -> PlatformResult<Vec<Badge>> {
        let envelope: Envelope<TwitchBadgeSet> = self.helix_get("/chat/badges/global", &[]).await?;
        Ok(flatten_badges(envelope.data))
    }

    async fn get_channel_badges(&self, channel_id: &str) -> PlatformResult<Vec<Badge>> {
        let params = [("broadcaster_id", channel_id.to_string())];
        let envelope: Envelope<TwitchBadgeSet> = self.helix_get("/chat/badges", &params).await?;
        Ok(flatten_badges(envelope.data))
    }

    async fn get_global_emotes(&self) -> PlatformResult<Vec<Emote>> {
        let envelope: Envelope<TwitchEmote> = self.helix_get("/chat/emotes/global", &[]).await?;
        Ok(envelope.data.into_iter().map(normalize_emote).collect())
    }

    async fn get_channel_emotes(&self, channel_id: &str) -> PlatformResult<Vec<Emote>> {
        let params = [("broadcaster_id", channel_id.to_string())];
        let envelope: Envelope<TwitchEmote> = self.helix_get("/chat/emotes", &params).await?;
        Ok(envelope.data.into_iter().map(normalize_emote).collect())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    cursor: String,
}

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
struct TwitchVideo {
    id: String,
    #[serde(default)]
    stream_id: Option<String>,
    user_id: String,
    user_login: String,
    title: String,
    #[serde(default)]
    description: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    view_count: i64,
    #[serde(default)]
    language: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Deserialize)]
struct TwitchStream {
    id: String,
    user_id: String,
    user_login: String,
    #[serde(default)]
    game_name: String,
    title: String,
    #[serde(default)]
    viewer_count: i64,
    started_at: DateTime<Utc>,
    #[serde(default)]
    language: String,
    #[serde(default)]
    thumbnail_url: String,
}

#[derive(Debug, Deserialize)]
struct TwitchUser {
    id: String,
    login: String,
    display_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    profile_image_url: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct TwitchGame {
    id: String,
    name: String,
    #[serde(default)]
    box_art_url: String,
}

#[derive(Debug, Deserialize)]
struct TwitchBadgeSet {
    set_id: String,
    #[serde(default = "Vec::new")]
    versions: Vec<TwitchBadgeVersion>,
}

#[derive(Debug, Deserialize)]
struct TwitchBadgeVersion {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image_url_1x: String,
    #[serde(default)]
    image_url_2x: String,
    #[serde(default)]
    image_url_4x: String,
}

#[derive(Debug, Deserialize)]
struct TwitchEmote {
    id: String,
    name: String,
    #[serde(default)]
    images: TwitchEmoteImages,
    #[serde(default = "Vec::new")]
    format: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TwitchEmoteImages {
    #[serde(default)]
    url_1x: String,
    #[serde(default)]
    url_2x: String,
    #[serde(default)]
    url_4x: String,
}

#[derive(Debug, Deserialize)]
struct GqlResponse {
    #[serde(default)]
    data: Option<GqlData>,
}

#[derive(Debug, Deserialize)]
struct GqlData {
    #[serde(default)]
    video: Option<GqlVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlVideo {
    #[serde(default)]
    mute_info: Option<GqlMuteInfo>,
    #[serde(default)]
    moments: Option<GqlMoments>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlMuteInfo {
    #[serde(default)]
    muted_segment_connection: Option<GqlMutedSegmentConnection>,
}

#[derive(Debug, Deserialize)]
struct GqlMutedSegmentConnection {
    #[serde(default = "Vec::new")]
    nodes: Vec<GqlMutedSegment>,
}

#[derive(Debug, Deserialize)]
struct GqlMutedSegment {
    offset: u32,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct GqlMoments {
    #[serde(default = "Vec::new")]
    edges: Vec<GqlMomentEdge>,
}

#[derive(Debug, Deserialize)]
struct GqlMomentEdge {
    node: GqlMoment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlMoment {
    id: String,
    position_milliseconds: u64,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    description: String,
}

// =============================================================================
// Normalization
// =============================================================================

/// Parse a Helix duration string like "3h20m10s" into whole seconds.
fn parse_helix_duration(raw: &str) -> u32 {
    let mut total = 0u32;
    let mut number = 0u32;
    for c in raw.chars() {
        if let Some(digit) = c.to_digit(10) {
            number = number * 10 + digit;
        } else {
            let multiplier = match c {
                'h' => 3600,
                'm' => 60,
                's' => 1,
                _ => 0,
            };
            total += number * multiplier;
            number = 0;
        }
    }
    total
}

fn or_unknown(value: String) -> String {
    if value.is_empty() {
        unknown()
    } else {
        value
    }
}

fn normalize_video(v: TwitchVideo) -> VideoInfo {
    let video_type = match v.kind.as_str() {
        "highlight" => VideoType::Highlight,
        "upload" => VideoType::Upload,
        _ => VideoType::Archive,
    };
    VideoInfo {
        duration: parse_helix_duration(&v.duration),
        id: v.id,
        stream_id: v.stream_id,
        channel_id: v.user_id,
        channel_login: v.user_login,
        title: v.title,
        description: or_unknown(v.description),
        created_at: v.created_at,
        url: or_unknown(v.url),
        thumbnail_url: or_unknown(v.thumbnail_url),
        view_count: v.view_count,
        language: or_unknown(v.language),
        video_type,
        chapters: Vec::new(),
        muted_segments: Vec::new(),
    }
}

fn normalize_stream(s: TwitchStream) -> LiveStreamInfo {
    LiveStreamInfo {
        id: s.id,
        channel_id: s.user_id,
        channel_login: s.user_login,
        title: s.title,
        category: or_unknown(s.game_name),
        viewer_count: s.viewer_count,
        started_at: s.started_at,
        thumbnail_url: or_unknown(s.thumbnail_url),
        language: or_unknown(s.language),
    }
}

fn normalize_user(u: TwitchUser) -> ChannelInfo {
    ChannelInfo {
        id: u.id,
        login: u.login,
        display_name: u.display_name,
        description: or_unknown(u.description),
        profile_image_url: or_unknown(u.profile_image_url),
        created_at: u.created_at,
    }
}

fn normalize_emote(e: TwitchEmote) -> Emote {
    let url = [&e.images.url_4x, &e.images.url_2x, &e.images.url_1x]
        .into_iter()
        .find(|u| !u.is_empty())
        .cloned()
        .unwrap_or_else(unknown);
    Emote {
        id: e.id,
        name: e.name,
        url,
        format: e.format.into_iter().next().unwrap_or_else(unknown),
    }
}

fn flatten_badges(sets: Vec<TwitchBadgeSet>) -> Vec<Badge> {
    sets.into_iter()
        .flat_map(|set| {
            let name = set.set_id;
            set.versions
                .into_iter()
                .map(move |v| Badge {
                    name: name.clone(),
                    version: v.id,
                    title: or_unknown(v.title),
                    image_url_1x: or_unknown(v.image_url_1x),
                    image_url_2x: or_unknown(v.image_url_2x),
                    image_url_4x: or_unknown(v.image_url_4x),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
