use crate::client::HttpClient;
use crate::config::SourceConfig;
use crate::rate_limiter::RateLimiter;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::sources::{encode, ensure_budget, SearchSource};
use crate::types::{AggregatorError, Resource, ResourceKind, Result, SourceDetails};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeVideo {
    pub id: YoutubeVideoId,
    pub snippet: YoutubeSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeVideoId {
    #[serde(rename = "videoId")]
    pub video_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeSnippet {
    pub title: String,
    pub description: String,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(rename = "channelTitle")]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub thumbnails: YoutubeThumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubeThumbnails {
    pub medium: Option<YoutubeThumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeThumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct YoutubeSearchResponse {
    #[serde(default)]
    items: Vec<YoutubeVideo>,
}

/// YouTube Data API search, shaping every query toward tutorial content.
/// The upstream requires an API key; without one this source reports
/// not-configured instead of attempting a call that would 403.
pub struct YoutubeSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl YoutubeSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, video: YoutubeVideo) -> Resource {
        let url = format!("https://www.youtube.com/watch?v={}", video.id.video_id);
        Resource::new(
            format!("youtube-{}", video.id.video_id),
            video.snippet.title,
            url,
            ResourceKind::Tutorial,
        )
        .with_description(video.snippet.description)
        .with_source(self.name())
        .with_details(SourceDetails::Video {
            channel: video.snippet.channel_title,
            thumbnail: video.snippet.thumbnails.medium.map(|t| t.url),
            published_at: video.snippet.published_at,
        })
    }
}

#[async_trait]
impl SearchSource for YoutubeSource {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Tutorial
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        let Some(key) = &self.config.api_key else {
            return Err(AggregatorError::NotConfigured {
                source: self.name().to_string(),
                reason: "YOUTUBE_API_KEY is required".to_string(),
            });
        };

        ensure_budget(&self.limiter, self.name()).await?;

        let url = format!(
            "{}/search?part=snippet&q={}&type=video&maxResults={}&key={}",
            self.config.base_url,
            encode(&format!("{query} tutorial")),
            limit,
            key
        );
        let headers = vec![("Accept", "application/json".to_string())];

        let response: YoutubeSearchResponse = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("youtube: found {} videos for \"{}\"", response.items.len(), query);
        Ok(response.items.into_iter().map(|v| self.normalize(v)).collect())
    }
}
