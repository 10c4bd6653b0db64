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
pub struct StackOverflowQuestion {
    pub question_id: u64,
    pub title: String,
    pub link: String,
    pub score: i64,
    pub answer_count: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StackOverflowResponse {
    #[serde(default)]
    items: Vec<StackOverflowQuestion>,
}

/// Stack Exchange advanced search against the stackoverflow site. A key is
/// optional and only raises the daily quota.
pub struct StackOverflowSource {
    config: SourceConfig,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl StackOverflowSource {
    pub fn new(config: SourceConfig, client: HttpClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    pub fn normalize(&self, question: StackOverflowQuestion) -> Resource {
        let description = format!(
            "Score: {} | Answers: {} | Tags: {}",
            question.score,
            question.answer_count,
            question.tags.join(", ")
        );
        Resource::new(
            format!("stackoverflow-{}", question.question_id),
            question.title,
            question.link,
            ResourceKind::Documentation,
        )
        .with_description(description)
        .with_source(self.name())
        .with_details(SourceDetails::Question {
            score: question.score,
            answers: question.answer_count,
            tags: question.tags,
        })
    }
}

#[async_trait]
impl SearchSource for StackOverflowSource {
    fn name(&self) -> &'static str {
        "stackoverflow"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Documentation
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Resource>> {
        ensure_budget(&self.limiter, self.name()).await?;

        let mut url = format!(
            "{}/search/advanced?order=desc&sort=relevance&q={}&site=stackoverflow&pagesize={}",
            self.config.base_url,
            encode(query),
            limit
        );
        if let Some(key) = &self.config.api_key {
            url.push_str(&format!("&key={key}"));
        }
        let headers = vec![("Accept", "application/json".to_string())];

        let response: StackOverflowResponse = with_retry(self.name(), DEFAULT_MAX_ATTEMPTS, || {
            self.client.get_json(self.name(), &url, &headers)
        })
        .await?;
        self.limiter.record_request(self.name()).await;

        info!("stackoverflow: found {} questions for \"{}\"", response.items.len(), query);
        Ok(response.items.into_iter().map(|q| self.normalize(q)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn normalize_summarizes_score_and_tags() {
        let source = StackOverflowSource::new(
            SourceConfig {
                api_key: None,
                base_url: "https://api.stackexchange.com/2.3".to_string(),
            },
            HttpClient::new(&HttpConfig::default()),
            Arc::new(RateLimiter::new()),
        );

        let raw: StackOverflowQuestion = serde_json::from_value(serde_json::json!({
            "question_id": 11227809,
            "title": "Why is processing a sorted array faster?",
            "link": "https://stackoverflow.com/questions/11227809",
            "score": 27000,
            "answer_count": 26,
            "tags": ["java", "performance"]
        }))
        .unwrap();

        let resource = source.normalize(raw);
        assert_eq!(resource.id, "stackoverflow-11227809");
        assert_eq!(resource.kind, ResourceKind::Documentation);
        assert_eq!(
            resource.description.as_deref(),
            Some("Score: 27000 | Answers: 26 | Tags: java, performance")
        );
    }
}
