use crate::client::HttpClient;
use crate::config::SourceConfig;
use crate::rate_limiter::RateLimiter;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::sources::{encode, ensure_budget, SearchSource};
use crate::types::{Resource, ResourceKind, Result, SourceDetails};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct GitlabProject {
    pub id: u64,
    pub name: String,
    pub web_url: String,
    pub description: Option<String>,
    pub star_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub namespace: GitlabNamespace,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitlabNamespace {
    pub name: String,
}

/// GitLab project search. Unauthenticated requests work at a lower quota;
/// a personal access token goes in the PRIVATE-TOKEN header.
pub struct GitlabSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl GitlabSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, project: GitlabProject) -> Resource {
        let description = project
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("GitLab project by {}", project.namespace.name));
        Resource::new(
            format!("gitlab-{}", project.id),
            project.name,
            project.web_url,
            ResourceKind::Repository,
        )
        .with_description(description)
        .with_source(self.name())
        .with_details(SourceDetails::Repository {
            stars: project.star_count,
            forks: project.forks_count,
            language: None,
        })
    }
}

#[async_trait]
impl SearchSource for GitlabSource {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Repository
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        ensure_budget(&self.limiter, self.name()).await?;

        if self.config.api_key.is_none() {
            warn!("gitlab: no API key configured, using unauthenticated requests");
        }

        let url = format!(
            "{}/projects?search={}&per_page={}&order_by=stars&sort=desc",
            self.config.base_url,
            encode(query),
            limit
        );
        let mut headers = vec![("Accept", "application/json".to_string())];
        if let Some(key) = &self.config.api_key {
            headers.push(("PRIVATE-TOKEN", key.clone()));
        }

        let projects: Vec<GitlabProject> = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("gitlab: found {} projects for \"{}\"", projects.len(), query);
        Ok(projects.into_iter().map(|p| self.normalize(p)).collect())
    }
}
