pub mod aggregator;
pub mod categories;
pub mod client;
pub mod config;
pub mod extractor;
pub mod rate_limiter;
pub mod retry;
pub mod sources;
pub mod types;

pub use aggregator::{ResourceAggregator, DEFAULT_PER_SOURCE_LIMIT};
pub use client::HttpClient;
pub use config::ApiConfig;
pub use extractor::FeatureExtractor;
pub use rate_limiter::RateLimiter;
pub use retry::{with_retry, ApiError, ApiErrorKind};
pub use sources::SearchSource;
pub use types::*;
