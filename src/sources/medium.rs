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
pub struct MediumPost {
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "readingTime")]
    pub reading_time: Option<f64>,
    pub claps: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MediumSearchResponse {
    #[serde(default)]
    items: Vec<MediumPost>,
}

/// Medium's partner API. Access requires an approved integration token, so
/// without one this source reports not-configured rather than attempting a
/// call that cannot succeed.
pub struct MediumSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl MediumSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, post: MediumPost) -> Resource {
        let description = post.content.as_deref().map(|content| {
            let mut snippet: String = content.chars().take(200).collect();
            if content.chars().count() > 200 {
                snippet.push_str("...");
            }
            snippet
        });
        let mut resource = Resource::new(
            format!("medium-{}", post.id),
            post.title,
            post.url,
            ResourceKind::Tutorial,
        )
        .with_source(self.name())
        .with_details(SourceDetails::Article {
            author: post.author,
            reactions: post.claps,
            reading_time_minutes: post.reading_time.map(|t| t.ceil() as u64),
        });
        if let Some(description) = description {
            resource = resource.with_description(description);
        }
        resource
    }
}

#[async_trait]
impl SearchSource for MediumSource {
    fn name(&self) -> &'static str {
        "medium"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Tutorial
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        let Some(key) = &self.config.api_key else {
            return Err(AggregatorError::NotConfigured {
                source: self.name().to_string(),
                reason: "MEDIUM_API_KEY is required (integration tokens need Medium's approval)"
                    .to_string(),
            });
        };

        ensure_budget(&self.limiter, self.name()).await?;

        let url = format!(
            "{}/search?q={}&limit={}",
            self.config.base_url,
            encode(query),
            limit
        );
        let headers = vec![
            ("Authorization", format!("Bearer {key}")),
            ("Accept", "application/json".to_string()),
        ];

        let response: MediumSearchResponse = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("medium: found {} posts for \"{}\"", response.items.len(), query);
        Ok(response.items.into_iter().map(|p| self.normalize(p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    fn source(api_key: Option<&str>) -> MediumSource {
        MediumSource::new(
            SourceConfig {
                api_key: api_key.map(str::to_string),
                base_url: "https://api.medium.com/v1".to_string(),
            },
            HttpClient::new(&HttpConfig::default()),
            Arc::new(RateLimiter::new()),
        )
    }

    #[tokio::test]
    async fn missing_token_reports_not_configured() {
        let err = source(None).search("graphql", 3).await.unwrap_err();
        match err {
            AggregatorError::NotConfigured { source, .. } => assert_eq!(source, "medium"),
            other => panic!("expected NotConfigured, got {other:?}"),
        }
    }

    #[test]
    fn normalize_rounds_reading_time_up() {
        let raw: MediumPost = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "title": "GraphQL at Scale",
            "url": "https://medium.com/@author/graphql-at-scale",
            "author": "author",
            "content": "Short body.",
            "readingTime": 6.2,
            "claps": 420
        }))
        .unwrap();

        let resource = source(Some("token")).normalize(raw);
        match resource.details {
            SourceDetails::Article { reading_time_minutes, .. } => {
                assert_eq!(reading_time_minutes, Some(7));
            }
            other => panic!("expected article details, got {other:?}"),
        }
    }
}
