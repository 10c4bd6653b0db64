use crate::categories;
use crate::client::HttpClient;
use crate::config::ApiConfig;
use crate::rate_limiter::RateLimiter;
use crate::sources::{
    CodepenSource, CodesandboxSource, DevtoSource, GithubSource, GitlabSource, GoogleSearchSource,
    MdnSource, MediumSource, NpmSource, RedditSource, SearchSource, StackOverflowSource,
    YoutubeSource,
};
use crate::types::{AggregatorError, Feature, Resource, ResourceKind, Result};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Upper bound on one adapter invocation, covering its whole retry budget.
/// One hung upstream can delay an aggregation by at most this long.
const SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_PER_SOURCE_LIMIT: usize = 3;

/// Fans a feature-name query out to every registered source concurrently
/// and merges the results into one de-duplicated, category-sorted list.
///
/// The join is settle-all: each source's outcome is collected
/// independently, a failing or hung source contributes zero results and a
/// warning, and the aggregation always waits for every source (each one is
/// individually bounded by `SOURCE_TIMEOUT`, so total latency is bounded
/// too). Sources are invoked in a fixed registration order and their
/// results concatenated in that same order, which makes the first-wins URL
/// deduplication deterministic across runs.
pub struct ResourceAggregator {
    sources: Vec<Arc<dyn SearchSource>>,
    limiter: Arc<RateLimiter>,
    source_timeout: Duration,
}

impl ResourceAggregator {
    /// Aggregator over the full default source set, sharing one HTTP client
    /// and one rate limiter across all adapters.
    pub fn new(config: &ApiConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new());
        let client = HttpClient::new(&config.http);
        let sources = default_sources(config, &client, &limiter);
        Self {
            sources,
            limiter,
            source_timeout: SOURCE_TIMEOUT,
        }
    }

    /// Aggregator over an explicit source list, used by tests and by
    /// callers that want a restricted fan-out.
    pub fn with_sources(sources: Vec<Arc<dyn SearchSource>>) -> Self {
        Self {
            sources,
            limiter: Arc::new(RateLimiter::new()),
            source_timeout: SOURCE_TIMEOUT,
        }
    }

    pub fn with_source_timeout(mut self, source_timeout: Duration) -> Self {
        self.source_timeout = source_timeout;
        self
    }

    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Search every source for a feature name. An empty list is a valid
    /// outcome (all sources failed or nothing matched); the only error is
    /// the contract violation of an aggregator with no sources.
    pub async fn search_for_feature(
        &self,
        feature_name: &str,
        per_source_limit: usize,
    ) -> Result<Vec<Resource>> {
        let merged = self
            .fan_out(&self.sources, feature_name, per_source_limit)
            .await?;
        info!(
            "aggregated {} unique resources for \"{}\"",
            merged.len(),
            feature_name
        );
        Ok(merged)
    }

    /// Search only the sources registered as producers of `kind`. Results
    /// are re-tagged to the requested kind: a repository host asked for
    /// templates returns template resources.
    pub async fn search_by_kind(
        &self,
        feature_name: &str,
        kind: ResourceKind,
        per_source_limit: usize,
    ) -> Result<Vec<Resource>> {
        let subset: Vec<Arc<dyn SearchSource>> = self
            .sources
            .iter()
            .filter(|s| categories::source_produces(s.name(), kind))
            .cloned()
            .collect();

        let query = match kind {
            ResourceKind::Template => format!("{feature_name} template"),
            _ => feature_name.to_string(),
        };

        let mut merged = self.fan_out(&subset, &query, per_source_limit).await?;
        for resource in &mut merged {
            resource.kind = kind;
        }
        info!(
            "aggregated {} unique {} resources for \"{}\"",
            merged.len(),
            kind,
            feature_name
        );
        Ok(merged)
    }

    /// Build a `Feature` value the external project store can persist
    /// verbatim, resources attached from one aggregation call.
    pub async fn generate_feature(&self, feature_name: &str) -> Result<Feature> {
        let resources = self
            .search_for_feature(feature_name, DEFAULT_PER_SOURCE_LIMIT)
            .await?;
        Ok(Feature::new(feature_name, resources))
    }

    async fn fan_out(
        &self,
        sources: &[Arc<dyn SearchSource>],
        query: &str,
        per_source_limit: usize,
    ) -> Result<Vec<Resource>> {
        if self.sources.is_empty() {
            return Err(AggregatorError::General(
                "aggregator has no sources configured".to_string(),
            ));
        }

        let tasks = sources.iter().map(|source| {
            let source = Arc::clone(source);
            let query = query.to_string();
            let source_timeout = self.source_timeout;
            async move {
                match timeout(source_timeout, source.search(&query, per_source_limit)).await {
                    Ok(Ok(resources)) => resources,
                    Ok(Err(err)) => {
                        warn!("{}: search failed: {}", source.name(), err);
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(
                            "{}: search timed out after {:?}",
                            source.name(),
                            source_timeout
                        );
                        Vec::new()
                    }
                }
            }
        });

        // join_all keeps source order even though the calls complete in
        // arbitrary real-time order.
        let settled = join_all(tasks).await;

        let mut seen = HashSet::new();
        let mut resources: Vec<Resource> = settled
            .into_iter()
            .flatten()
            .filter(|r| seen.insert(r.url.clone()))
            .collect();
        categories::sort_by_priority(&mut resources);
        Ok(resources)
    }
}

/// The fixed source registration order. Deduplication is first-wins over
/// the concatenation of results in this order, so reordering changes which
/// source a duplicated URL is attributed to.
fn default_sources(
    config: &ApiConfig,
    client: &HttpClient,
    limiter: &Arc<RateLimiter>,
) -> Vec<Arc<dyn SearchSource>> {
    vec![
        Arc::new(GithubSource::new(
            config.github.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(GitlabSource::new(
            config.gitlab.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(NpmSource::new(
            config.npm.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(YoutubeSource::new(
            config.youtube.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(StackOverflowSource::new(
            config.stackoverflow.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(MdnSource::new(
            config.mdn.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(GoogleSearchSource::new(
            config.google.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(RedditSource::new(
            config.reddit.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(DevtoSource::new(
            config.devto.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(MediumSource::new(
            config.medium.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(CodesandboxSource::new(
            config.codesandbox.clone(),
            client.clone(),
            Arc::clone(limiter),
        )),
        Arc::new(CodepenSource::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_source_list_is_a_contract_violation() {
        let aggregator = ResourceAggregator::with_sources(Vec::new());
        let err = aggregator.search_for_feature("react", 3).await.unwrap_err();
        assert!(matches!(err, AggregatorError::General(_)));
    }

    #[test]
    fn default_registration_order_is_stable() {
        let config = ApiConfig::from_env();
        let aggregator = ResourceAggregator::new(&config);
        let names: Vec<&str> = aggregator.sources.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "github",
                "gitlab",
                "npm",
                "youtube",
                "stackoverflow",
                "mdn",
                "google",
                "reddit",
                "devto",
                "medium",
                "codesandbox",
                "codepen",
            ]
        );
    }
}
