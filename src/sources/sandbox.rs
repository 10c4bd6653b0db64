use crate::client::HttpClient;
use crate::config::SourceConfig;
use crate::rate_limiter::RateLimiter;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::sources::{encode, ensure_budget, placeholder, SearchSource};
use crate::types::{Resource, ResourceKind, Result, SourceDetails};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct CodesandboxProject {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub alias: Option<String>,
    pub view_count: Option<u64>,
    pub author: Option<CodesandboxAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodesandboxAuthor {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CodesandboxResponse {
    data: Option<CodesandboxData>,
}

#[derive(Debug, Deserialize)]
struct CodesandboxData {
    #[serde(default)]
    sandboxes: Vec<CodesandboxProject>,
}

/// CodeSandbox template search over its GraphQL endpoint. The endpoint is
/// unofficial; when it fails the source degrades to placeholder links into
/// the CodeSandbox search page instead of reporting an error.
pub struct CodesandboxSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl CodesandboxSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, project: CodesandboxProject, query: &str) -> Resource {
        let slug = project.alias.clone().unwrap_or_else(|| project.id.clone());
        let url = format!("https://codesandbox.io/s/{slug}");
        let title = project
            .title
            .clone()
            .unwrap_or_else(|| format!("{query} sandbox"));
        let mut resource = Resource::new(
            format!("codesandbox-{}", project.id),
            title,
            url,
            ResourceKind::Template,
        )
        .with_source(self.name())
        .with_details(SourceDetails::Link {
            site: project.author.and_then(|a| a.username),
        });
        if let Some(description) = project.description {
            resource = resource.with_description(description);
        }
        resource
    }

    fn fallback(&self, query: &str, limit: usize) -> Vec<Resource> {
        let search_url = format!("https://codesandbox.io/search?query={}", encode(query));
        vec![placeholder(
            self.name(),
            ResourceKind::Template,
            format!("{query} sandboxes on CodeSandbox"),
            search_url,
        )]
        .into_iter()
        .take(limit)
        .collect()
    }
}

#[async_trait]
impl SearchSource for CodesandboxSource {
    fn name(&self) -> &'static str {
        "codesandbox"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Template
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        ensure_budget(&self.limiter, self.name()).await?;

        let url = format!("{}/graphql", self.config.base_url);
        let body = serde_json::json!({
            "query": "query SearchSandboxes($query: String!, $limit: Int!) { \
                sandboxes(limit: $limit, orderBy: { field: \"view_count\", direction: DESC }, \
                          filters: { title: $query }) { \
                    id title description alias view_count author { username } } }",
            "variables": { "query": query, "limit": limit }
        });
        let headers = vec![("Accept", "application/json".to_string())];

        let response: std::result::Result<CodesandboxResponse, _> =
            with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
                self.client.post_json(self.name(), &url, &body, &headers)
            })
            .await;

        match response {
            Ok(response) => {
                self.limiter.record_request(self.name()).await;
                let projects = response.data.map(|d| d.sandboxes).unwrap_or_default();
                info!("codesandbox: found {} sandboxes for \"{}\"", projects.len(), query);
                Ok(projects
                    .into_iter()
                    .map(|p| self.normalize(p, query))
                    .collect())
            }
            Err(err) => {
                warn!("codesandbox: API failed ({}), returning search-page links", err);
                Ok(self.fallback(query, limit))
            }
        }
    }
}

/// CodePen has no public JSON search API, so this source only produces
/// placeholder deep-links into CodePen's own search and tag pages. The
/// links are still useful to a user and cost no upstream request.
pub struct CodepenSource;

impl CodepenSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CodepenSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchSource for CodepenSource {
    fn name(&self) -> &'static str {
        "codepen"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Template
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        let tag: String = query
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        let links = vec![
            placeholder(
                self.name(),
                ResourceKind::Template,
                format!("{query} pens on CodePen"),
                format!("https://codepen.io/search/pens?q={}", encode(query)),
            ),
            placeholder(
                self.name(),
                ResourceKind::Template,
                format!("Popular {query} pens"),
                format!("https://codepen.io/tag/{tag}"),
            ),
        ];
        Ok(links.into_iter().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn normalize_prefers_the_alias_slug() {
        let source = CodesandboxSource::new(
            SourceConfig {
                api_key: None,
                base_url: "https://codesandbox.io/api".to_string(),
            },
            HttpClient::new(&HttpConfig::default()),
            Arc::new(RateLimiter::new()),
        );

        let raw: CodesandboxProject = serde_json::from_value(serde_json::json!({
            "id": "abc12",
            "title": "React starter",
            "description": "Minimal React template",
            "alias": "react-starter-abc12",
            "view_count": 9000,
            "author": { "username": "sandboxer" }
        }))
        .unwrap();

        let resource = source.normalize(raw, "react");
        assert_eq!(resource.url, "https://codesandbox.io/s/react-starter-abc12");
        assert_eq!(resource.kind, ResourceKind::Template);
    }

    #[tokio::test]
    async fn codepen_placeholders_are_unique_per_query() {
        let source = CodepenSource::new();
        let react = source.search("react", 5).await.unwrap();
        let vue = source.search("vue", 5).await.unwrap();
        assert_eq!(react.len(), 2);
        assert!(react.iter().all(|r| r.details == SourceDetails::None));
        assert_ne!(react[0].url, vue[0].url);
        assert_ne!(react[0].url, react[1].url);
    }
}
