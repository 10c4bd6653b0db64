use crate::client::HttpClient;
use crate::config::RedditConfig;
use crate::rate_limiter::RateLimiter;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::sources::{encode, ensure_budget, SearchSource};
use crate::types::{AggregatorError, Resource, ResourceKind, Result, SourceDetails};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub permalink: String,
    pub author: Option<String>,
    pub score: Option<i64>,
    pub subreddit: Option<String>,
    #[serde(default)]
    pub selftext: String,
}

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: RedditListingData,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    #[serde(default)]
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Reddit search over the OAuth API. Requires a client-credentials pair;
/// the bearer token is cached until shortly before its expiry.
pub struct RedditSource {
    config: RedditConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
    token: RwLock<Option<CachedToken>>,
}

impl RedditSource {
    pub fn new(config: RedditConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
            token: RwLock::new(None),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let (Some(client_id), Some(client_secret)) =
            (&self.config.client_id, &self.config.client_secret)
        else {
            return Err(AggregatorError::NotConfigured {
                source: self.name().to_string(),
                reason: "REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET are required".to_string(),
            });
        };

        {
            let cached = self.token.read().await;
            if let Some(cached) = cached.as_ref() {
                if Utc::now() < cached.expires_at {
                    return Ok(cached.token.clone());
                }
            }
        }

        debug!("reddit: requesting new access token");
        let response: RedditTokenResponse = self
            .client
            .post_form(
                self.name(),
                &self.config.token_url,
                &[("grant_type", "client_credentials")],
                Some((client_id.as_str(), client_secret.as_str())),
            )
            .await?;

        // Refresh a minute early so an in-flight search never carries an
        // expired token.
        let expires_at =
            Utc::now() + Duration::seconds(response.expires_in.saturating_sub(60) as i64);
        let mut cached = self.token.write().await;
        *cached = Some(CachedToken {
            token: response.access_token.clone(),
            expires_at,
        });
        Ok(response.access_token)
    }

    pub fn normalize(&self, post: RedditPost) -> Resource {
        let url = format!("https://www.reddit.com{}", post.permalink);
        let mut description = post.selftext.chars().take(200).collect::<String>();
        if post.selftext.chars().count() > 200 {
            description.push_str("...");
        }
        let mut resource = Resource::new(
            format!("reddit-{}", post.id),
            post.title,
            url,
            ResourceKind::Documentation,
        )
        .with_source(self.name())
        .with_details(SourceDetails::Article {
            author: post.author,
            reactions: post.score.map(|s| s.max(0) as u64),
            reading_time_minutes: None,
        });
        if !description.is_empty() {
            resource = resource.with_description(description);
        } else if let Some(subreddit) = post.subreddit {
            resource = resource.with_description(format!("Discussion on r/{subreddit}"));
        }
        resource
    }
}

#[async_trait]
impl SearchSource for RedditSource {
    fn name(&self) -> &'static str {
        "reddit"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Documentation
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        ensure_budget(&self.limiter, self.name()).await?;
        let token = self.access_token().await?;

        let url = format!(
            "{}/search?q={}&limit={}&sort=relevance",
            self.config.base_url,
            encode(&format!("{query} programming")),
            limit
        );
        let headers = vec![
            ("Authorization", format!("Bearer {token}")),
            ("Accept", "application/json".to_string()),
        ];

        let listing: RedditListing = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("reddit: found {} posts for \"{}\"", listing.data.children.len(), query);
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| self.normalize(child.data))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    fn source() -> RedditSource {
        RedditSource::new(
            RedditConfig {
                client_id: None,
                client_secret: None,
                base_url: "https://oauth.reddit.com".to_string(),
                token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            },
            HttpClient::new(&HttpConfig::default()),
            Arc::new(RateLimiter::new()),
        )
    }

    #[tokio::test]
    async fn missing_credentials_report_not_configured() {
        let err = source().search("rust", 3).await.unwrap_err();
        assert!(matches!(err, AggregatorError::NotConfigured { .. }));
    }

    #[test]
    fn normalize_truncates_long_selftext() {
        let raw: RedditPost = serde_json::from_value(serde_json::json!({
            "id": "abc123",
            "title": "What's the best way to learn Rust?",
            "permalink": "/r/rust/comments/abc123/whats_the_best_way/",
            "author": "crab_fan",
            "score": 512,
            "subreddit": "rust",
            "selftext": "x".repeat(300)
        }))
        .unwrap();

        let resource = source().normalize(raw);
        assert_eq!(resource.url, "https://www.reddit.com/r/rust/comments/abc123/whats_the_best_way/");
        assert_eq!(resource.description.as_ref().unwrap().chars().count(), 203);
        assert!(resource.description.unwrap().ends_with("..."));
    }
}
