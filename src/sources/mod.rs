use crate::rate_limiter::RateLimiter;
use crate::retry::{ApiError, ApiErrorKind};
use crate::types::{Resource, ResourceKind, Result};
use async_trait::async_trait;

pub mod devto;
pub mod github;
pub mod gitlab;
pub mod google;
pub mod mdn;
pub mod medium;
pub mod npm;
pub mod reddit;
pub mod sandbox;
pub mod stackoverflow;
pub mod youtube;

pub use devto::DevtoSource;
pub use github::GithubSource;
pub use gitlab::GitlabSource;
pub use google::GoogleSearchSource;
pub use mdn::MdnSource;
pub use medium::MediumSource;
pub use npm::NpmSource;
pub use reddit::RedditSource;
pub use sandbox::{CodepenSource, CodesandboxSource};
pub use stackoverflow::StackOverflowSource;
pub use youtube::YoutubeSource;

/// One upstream developer-resource API.
///
/// `kind` is the fixed category this adapter produces. `search` checks the
/// local rate-limit budget, calls the upstream through the retry executor,
/// and normalizes raw items to `Resource`s. Failures are returned as errors
/// here; the aggregator is the layer that converts them to zero results.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Stable source identifier, also used as the rate-limiter key and in
    /// the category registry's source lists.
    fn name(&self) -> &'static str;

    /// The resource kind this adapter produces.
    fn kind(&self) -> ResourceKind;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>>;
}

/// Fail fast with a `RateLimited` error (and a human wait estimate) when
/// the local budget for `source` is exhausted, instead of burning an
/// upstream request that would 429 anyway.
pub async fn ensure_budget(limiter: &RateLimiter, source: &str) -> Result<()> {
    if limiter.can_make_request(source).await {
        return Ok(());
    }
    let estimate = limiter.wait_estimate(source).await;
    Err(ApiError::new(
        source,
        ApiErrorKind::RateLimited,
        format!("local rate limit budget exhausted, {estimate}"),
    )
    .into())
}

/// Percent-encode a query for use in a URL query string.
pub fn encode(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.as_bytes()).collect()
}

/// Synthetic degraded result deep-linking to a source's own search page.
/// Carries no upstream metadata (`SourceDetails::None`), which is what
/// keeps placeholders distinguishable from real hits; the query embedded in
/// the URL keeps them from colliding across calls or with real results.
pub fn placeholder(
    source: &str,
    kind: ResourceKind,
    title: impl Into<String>,
    search_url: impl Into<String>,
) -> Resource {
    let url = search_url.into();
    Resource::new(format!("{source}-search-{}", short_hash(&url)), title, url, kind)
        .with_source(source)
}

/// Stable id for resources whose upstream has no native identifier,
/// derived from the URL (FNV-1a, hex).
pub fn short_hash(input: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AggregatorError;

    #[tokio::test]
    async fn exhausted_budget_fails_fast_with_rate_limited() {
        let limiter = RateLimiter::new();
        for _ in 0..60 {
            limiter.record_request("reddit").await;
        }
        let err = ensure_budget(&limiter, "reddit").await.unwrap_err();
        match err {
            AggregatorError::Api(api) => {
                assert_eq!(api.kind, ApiErrorKind::RateLimited);
                assert!(api.message.contains("wait"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn placeholders_embed_the_query_in_the_url() {
        let a = placeholder(
            "codepen",
            ResourceKind::Template,
            "react examples on CodePen",
            format!("https://codepen.io/search/pens?q={}", encode("react")),
        );
        let b = placeholder(
            "codepen",
            ResourceKind::Template,
            "vue examples on CodePen",
            format!("https://codepen.io/search/pens?q={}", encode("vue")),
        );
        assert_ne!(a.url, b.url);
        assert_ne!(a.id, b.id);
        assert_eq!(a.details, crate::types::SourceDetails::None);
    }

    #[test]
    fn query_encoding_escapes_reserved_characters() {
        assert_eq!(encode("c++ templates"), "c%2B%2B+templates");
    }
}
