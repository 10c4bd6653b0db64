use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::retry::ApiError;

/// Closed set of resource categories. Upstream categories that don't map
/// cleanly onto one of these are folded into the nearest kind during
/// normalization, or the item is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Documentation,
    Tutorial,
    Repository,
    Template,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Documentation,
        ResourceKind::Tutorial,
        ResourceKind::Repository,
        ResourceKind::Template,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Documentation => "documentation",
            ResourceKind::Tutorial => "tutorial",
            ResourceKind::Repository => "repository",
            ResourceKind::Template => "template",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "documentation" => Ok(ResourceKind::Documentation),
            "tutorial" => Ok(ResourceKind::Tutorial),
            "repository" => Ok(ResourceKind::Repository),
            "template" => Ok(ResourceKind::Template),
            other => Err(AggregatorError::General(format!(
                "unknown resource kind: {other}"
            ))),
        }
    }
}

/// User-assigned triage state. Aggregation always emits `Unread`; the other
/// states are set by the caller after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Unread,
    Read,
    Used,
    Broken,
}

/// Source-specific advisory metadata. One variant per source family rather
/// than an open map, so star counts and vote totals stay typed without
/// forcing a uniform schema on every source. Placeholder results always
/// carry `None`, which is what distinguishes them from real hits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SourceDetails {
    Repository {
        stars: Option<u64>,
        forks: Option<u64>,
        language: Option<String>,
    },
    Package {
        version: Option<String>,
        score: Option<f64>,
    },
    Video {
        channel: Option<String>,
        thumbnail: Option<String>,
        published_at: Option<String>,
    },
    Question {
        score: i64,
        answers: u64,
        tags: Vec<String>,
    },
    Article {
        author: Option<String>,
        reactions: Option<u64>,
        reading_time_minutes: Option<u64>,
    },
    Link {
        site: Option<String>,
    },
    #[default]
    None,
}

/// The canonical result unit produced by every adapter.
///
/// `url` is the deduplication key: within one aggregation call's output no
/// two resources share a url. `id` is derived from the source name plus the
/// upstream's native identifier and is only unique within a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub url: String,
    pub kind: ResourceKind,
    pub status: ResourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: String,
    #[serde(default)]
    pub details: SourceDetails,
}

impl Resource {
    /// A resource with no upstream metadata attached. Used both as the base
    /// constructor and for synthetic placeholder results that deep-link to a
    /// source's own search page.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        kind: ResourceKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            kind,
            status: ResourceStatus::Unread,
            description: None,
            source: String::new(),
            details: SourceDetails::None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_details(mut self, details: SourceDetails) -> Self {
        self.details = details;
        self
    }
}

/// A named technology keyword extracted from a project description, with
/// the resources one aggregation call attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub resources: Vec<Resource>,
}

impl Feature {
    pub fn new(name: impl Into<String>, resources: Vec<Resource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            resources,
        }
    }
}

/// Container of features. Lifecycle (persistence, ownership) belongs to the
/// external project store; this crate only builds the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub features: Vec<Feature>,
}

impl Project {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
            features: Vec::new(),
        }
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn remove_feature(&mut self, feature_id: Uuid) {
        self.features.retain(|f| f.id != feature_id);
    }
}

// Display/Error/From are hand-written because thiserror treats any field
// named `source` as the error source, and NotConfigured's is a plain String.
#[derive(Debug)]
pub enum AggregatorError {
    Http(reqwest::Error),
    InvalidUrl(url::ParseError),
    Api(ApiError),
    NotConfigured { source: String, reason: String },
    Serialization(serde_json::Error),
    General(String),
}

impl std::fmt::Display for AggregatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::InvalidUrl(e) => write!(f, "Invalid URL: {e}"),
            Self::Api(e) => std::fmt::Display::fmt(e, f),
            Self::NotConfigured { source, reason } => {
                write!(f, "{source} is not configured: {reason}")
            }
            Self::Serialization(e) => write!(f, "Serialization error: {e}"),
            Self::General(msg) => write!(f, "General error: {msg}"),
        }
    }
}

impl std::error::Error for AggregatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::InvalidUrl(e) => Some(e),
            Self::Api(e) => std::error::Error::source(e),
            Self::Serialization(e) => Some(e),
            Self::NotConfigured { .. } | Self::General(_) => None,
        }
    }
}

impl From<reqwest::Error> for AggregatorError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<url::ParseError> for AggregatorError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e)
    }
}

impl From<ApiError> for AggregatorError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<serde_json::Error> for AggregatorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("webinar".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn new_resources_default_to_unread() {
        let r = Resource::new("github-1", "tokio", "https://github.com/tokio-rs/tokio", ResourceKind::Repository);
        assert_eq!(r.status, ResourceStatus::Unread);
        assert_eq!(r.details, SourceDetails::None);
    }

    #[test]
    fn remove_feature_leaves_others() {
        let mut project = Project::new("blog", "a blog platform");
        let keep = Feature::new("authentication", Vec::new());
        let drop = Feature::new("markdown editor", Vec::new());
        let drop_id = drop.id;
        project.add_feature(keep);
        project.add_feature(drop);
        project.remove_feature(drop_id);
        assert_eq!(project.features.len(), 1);
        assert_eq!(project.features[0].name, "authentication");
    }
}
