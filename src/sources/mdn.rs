use crate::client::HttpClient;
use crate::config::SourceConfig;
use crate::rate_limiter::RateLimiter;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::sources::{encode, ensure_budget, short_hash, SearchSource};
use crate::types::{Resource, ResourceKind, Result, SourceDetails};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct MdnDocument {
    pub mdn_url: String,
    pub title: String,
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MdnSearchResponse {
    #[serde(default)]
    documents: Vec<MdnDocument>,
}

/// MDN's public search API. No credential, no server-side page size, so the
/// limit is applied client-side.
pub struct MdnSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl MdnSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, doc: MdnDocument) -> Resource {
        let url = format!("https://developer.mozilla.org{}", doc.mdn_url);
        // Last path segment is the closest thing MDN has to a native id.
        let native_id = doc
            .mdn_url
            .rsplit('/')
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| short_hash(&url));
        let description = doc
            .summary
            .clone()
            .unwrap_or_else(|| format!("Official MDN documentation for {}", doc.title));

        Resource::new(format!("mdn-{native_id}"), doc.title, url, ResourceKind::Documentation)
            .with_description(description)
            .with_source(self.name())
            .with_details(SourceDetails::Link {
                site: Some("developer.mozilla.org".to_string()),
            })
    }
}

#[async_trait]
impl SearchSource for MdnSource {
    fn name(&self) -> &'static str {
        "mdn"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Documentation
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        ensure_budget(&self.limiter, self.name()).await?;

        let url = format!("{}/api/v1/search?q={}&locale=en-US", self.config.base_url, encode(query));
        let headers = vec![("Accept", "application/json".to_string())];

        let response: MdnSearchResponse = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        let documents: Vec<MdnDocument> = response.documents.into_iter().take(limit).collect();
        info!("mdn: found {} documents for \"{}\"", documents.len(), query);
        Ok(documents.into_iter().map(|d| self.normalize(d)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn normalize_prefixes_the_mdn_host() {
        let source = MdnSource::new(
            SourceConfig {
                api_key: None,
                base_url: "https://developer.mozilla.org".to_string(),
            },
            HttpClient::new(&HttpConfig::default()),
            Arc::new(RateLimiter::new()),
        );

        let raw: MdnDocument = serde_json::from_value(serde_json::json!({
            "mdn_url": "/en-US/docs/Web/API/Fetch_API",
            "title": "Fetch API",
            "summary": "The Fetch API provides an interface for fetching resources."
        }))
        .unwrap();

        let resource = source.normalize(raw);
        assert_eq!(resource.id, "mdn-Fetch_API");
        assert_eq!(
            resource.url,
            "https://developer.mozilla.org/en-US/docs/Web/API/Fetch_API"
        );
        assert_eq!(resource.kind, ResourceKind::Documentation);
    }
}
