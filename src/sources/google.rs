use crate::client::HttpClient;
use crate::config::GoogleConfig;
use crate::rate_limiter::RateLimiter;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::sources::{encode, ensure_budget, SearchSource};
use crate::types::{AggregatorError, Resource, ResourceKind, Result, SourceDetails};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSearchResult {
    pub title: String,
    pub link: String,
    pub snippet: Option<String>,
    #[serde(rename = "displayLink")]
    pub display_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleSearchResponse {
    #[serde(default)]
    items: Vec<GoogleSearchResult>,
}

/// Google Custom Search, shaped toward developer documentation. Needs both
/// an API key and a search-engine id; with either missing the source
/// reports not-configured.
pub struct GoogleSearchSource {
    config: GoogleConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl GoogleSearchSource {
    pub fn new(config: GoogleConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, result: GoogleSearchResult) -> Resource {
        // Web results have no native id beyond the URL itself.
        let id = format!("google-{}", super::short_hash(&result.link));
        let mut resource = Resource::new(id, result.title, result.link, ResourceKind::Documentation)
            .with_source(self.name())
            .with_details(SourceDetails::Link {
                site: result.display_link,
            });
        if let Some(snippet) = result.snippet {
            resource = resource.with_description(snippet);
        }
        resource
    }
}

#[async_trait]
impl SearchSource for GoogleSearchSource {
    fn name(&self) -> &'static str {
        "google"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Documentation
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        let (Some(key), Some(cx)) = (&self.config.api_key, &self.config.search_engine_id) else {
            return Err(AggregatorError::NotConfigured {
                source: self.name().to_string(),
                reason: "GOOGLE_API_KEY and GOOGLE_SEARCH_ENGINE_ID are required".to_string(),
            });
        };

        ensure_budget(&self.limiter, self.name()).await?;

        let url = format!(
            "{}?key={}&cx={}&q={}&num={}",
            self.config.base_url,
            key,
            cx,
            encode(&format!("{query} documentation for developers")),
            limit.min(10)
        );
        let headers = vec![("Accept", "application/json".to_string())];

        let response: GoogleSearchResponse = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("google: found {} results for \"{}\"", response.items.len(), query);
        Ok(response.items.into_iter().map(|r| self.normalize(r)).collect())
    }
}
