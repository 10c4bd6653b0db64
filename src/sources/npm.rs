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
pub struct NpmSearchObject {
    pub package: NpmPackage,
    pub score: Option<NpmScore>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpmPackage {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    #[serde(default)]
    pub links: NpmLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NpmLinks {
    pub npm: Option<String>,
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpmScore {
    pub r#final: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NpmSearchResponse {
    #[serde(default)]
    objects: Vec<NpmSearchObject>,
}

/// npm registry search. Fully public, no credential.
pub struct NpmSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl NpmSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, object: NpmSearchObject) -> Resource {
        let npm_url = object
            .package
            .links
            .npm
            .clone()
            .unwrap_or_else(|| format!("https://www.npmjs.com/package/{}", object.package.name));
        // Prefer the repository page when the package links one.
        let url = object.package.links.repository.clone().unwrap_or(npm_url);
        let description = object
            .package
            .description
            .clone()
            .unwrap_or_else(|| format!("npm package - v{}", object.package.version));
        // Scoped names contain characters that don't belong in an id.
        let id = format!("npm-{}", object.package.name.replace(['@', '/'], "-"));

        Resource::new(id, object.package.name, url, ResourceKind::Repository)
            .with_description(description)
            .with_source(self.name())
            .with_details(SourceDetails::Package {
                version: Some(object.package.version),
                score: object.score.and_then(|s| s.r#final),
            })
    }
}

#[async_trait]
impl SearchSource for NpmSource {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Repository
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        ensure_budget(&self.limiter, self.name()).await?;

        let url = format!(
            "{}/-/v1/search?text={}&size={}&popularity=1&quality=1&maintenance=1",
            self.config.base_url,
            encode(query),
            limit
        );
        let headers = vec![("Accept", "application/json".to_string())];

        let response: NpmSearchResponse = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("npm: found {} packages for \"{}\"", response.objects.len(), query);
        Ok(response.objects.into_iter().map(|o| self.normalize(o)).collect())
    }
}
