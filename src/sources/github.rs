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
pub struct GithubRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubSearchResponse {
    items: Vec<GithubRepository>,
}

/// GitHub repository search. Works unauthenticated at a much lower quota;
/// a token raises it to the published 5000/hour.
pub struct GithubSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl GithubSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, repo: GithubRepository, query: &str) -> Resource {
        let description = repo
            .description
            .clone()
            .unwrap_or_else(|| format!("A GitHub repository for {query}"));
        Resource::new(
            format!("github-{}", repo.id),
            repo.name,
            repo.html_url,
            ResourceKind::Repository,
        )
        .with_description(description)
        .with_source(self.name())
        .with_details(SourceDetails::Repository {
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            language: repo.language,
        })
    }
}

#[async_trait]
impl SearchSource for GithubSource {
    fn name(&self) -> &'static str {
        "github"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Repository
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        ensure_budget(&self.limiter, self.name()).await?;

        let url = format!(
            "{}/search/repositories?q={}&sort=stars&order=desc&per_page={}",
            self.config.base_url,
            encode(query),
            limit
        );
        let mut headers = vec![("Accept", "application/vnd.github.v3+json".to_string())];
        if let Some(key) = &self.config.api_key {
            headers.push(("Authorization", format!("token {key}")));
        }

        let response: GithubSearchResponse = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("github: found {} repositories for \"{}\"", response.items.len(), query);
        Ok(response
            .items
            .into_iter()
            .map(|repo| self.normalize(repo, query))
            .collect())
    }
}
