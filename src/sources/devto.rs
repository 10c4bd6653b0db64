use crate::client::HttpClient;
use crate::config::SourceConfig;
use crate::rate_limiter::RateLimiter;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::sources::{encode, ensure_budget, SearchSource};
use crate::types::{Resource, ResourceKind, Result, SourceDetails};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct DevtoArticle {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub user: Option<DevtoUser>,
    pub reading_time_minutes: Option<u64>,
    pub positive_reactions_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevtoUser {
    pub name: Option<String>,
}

/// dev.to articles by tag. The API is public; a key only raises limits.
pub struct DevtoSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl DevtoSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, article: DevtoArticle) -> Resource {
        let mut resource = Resource::new(
            format!("devto-{}", article.id),
            article.title,
            article.url,
            ResourceKind::Tutorial,
        )
        .with_source(self.name())
        .with_details(SourceDetails::Article {
            author: article.user.and_then(|u| u.name),
            reactions: article.positive_reactions_count,
            reading_time_minutes: article.reading_time_minutes,
        });
        if let Some(description) = article.description {
            resource = resource.with_description(description);
        }
        resource
    }
}

#[async_trait]
impl SearchSource for DevtoSource {
    fn name(&self) -> &'static str {
        "devto"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Tutorial
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        ensure_budget(&self.limiter, self.name()).await?;

        // dev.to tags are single lowercase words; "react native" -> "reactnative".
        let tag: String = query
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let url = format!(
            "{}/articles?per_page={}&tag={}",
            self.config.base_url,
            limit,
            encode(&tag)
        );
        let mut headers = vec![("Accept", "application/json".to_string())];
        if let Some(key) = &self.config.api_key {
            headers.push(("api-key", key.clone()));
        }

        let articles: Vec<DevtoArticle> = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("devto: found {} articles for \"{}\"", articles.len(), query);
        Ok(articles.into_iter().map(|a| self.normalize(a)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn normalize_carries_reading_time_and_reactions() {
        let source = DevtoSource::new(
            SourceConfig {
                api_key: None,
                base_url: "https://dev.to/api".to_string(),
            },
            HttpClient::new(&HttpConfig::default()),
            Arc::new(RateLimiter::new()),
        );

        let raw: DevtoArticle = serde_json::from_value(serde_json::json!({
            "id": 12345,
            "title": "Understanding React Hooks",
            "description": "A deep dive into hooks.",
            "url": "https://dev.to/someone/understanding-react-hooks",
            "user": { "name": "Someone" },
            "reading_time_minutes": 7,
            "positive_reactions_count": 150
        }))
        .unwrap();

        let resource = source.normalize(raw);
        assert_eq!(resource.id, "devto-12345");
        assert_eq!(resource.kind, ResourceKind::Tutorial);
        assert_eq!(
            resource.details,
            SourceDetails::Article {
                author: Some("Someone".to_string()),
                reactions: Some(150),
                reading_time_minutes: Some(7),
            }
        );
    }
}
