use backoff::backoff::Backoff;
use backoff::exponential::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Classification of an upstream failure. Only the kinds that plausibly
/// resolve on their own are retryable; anything unclassified is terminal so
/// a bug can't turn into an infinite retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    NotFound,
    RateLimited,
    ServerError,
    NetworkError,
    QuotaExceeded,
    Unknown,
}

impl ApiErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiErrorKind::RateLimited
                | ApiErrorKind::ServerError
                | ApiErrorKind::NetworkError
                | ApiErrorKind::QuotaExceeded
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::NotFound => "not_found",
            ApiErrorKind::RateLimited => "rate_limited",
            ApiErrorKind::ServerError => "server_error",
            ApiErrorKind::NetworkError => "network_error",
            ApiErrorKind::QuotaExceeded => "quota_exceeded",
            ApiErrorKind::Unknown => "unknown",
        }
    }
}

/// Structured failure from a single upstream source, carrying the
/// classification and how many attempts were made before giving up.
// Display/Error are hand-written because thiserror treats any field named
// `source` as the error source, and ours is a plain String.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub source: String,
    pub kind: ApiErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub attempts: u32,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{source} API ({kind}): {message}",
            source = self.source,
            kind = self.kind.as_str(),
            message = self.message
        )
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn new(source: impl Into<String>, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            message: message.into(),
            status: None,
            attempts: 0,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Map an HTTP status to the error taxonomy. 403 is folded into
    /// `RateLimited` because the big code hosts use it for secondary rate
    /// limits; 404 and 401 are terminal.
    pub fn from_status(source: &str, status: u16, body: &str) -> Self {
        let kind = match status {
            401 => ApiErrorKind::Unauthorized,
            403 | 429 => ApiErrorKind::RateLimited,
            404 => ApiErrorKind::NotFound,
            500..=599 => ApiErrorKind::ServerError,
            _ if body.to_ascii_lowercase().contains("quota") => ApiErrorKind::QuotaExceeded,
            _ => ApiErrorKind::Unknown,
        };
        let message = match kind {
            ApiErrorKind::Unauthorized => "invalid or missing credentials".to_string(),
            ApiErrorKind::RateLimited => "rate limit exceeded, try again later".to_string(),
            ApiErrorKind::NotFound => "resource not found".to_string(),
            ApiErrorKind::ServerError => format!("server error (HTTP {status})"),
            ApiErrorKind::QuotaExceeded => "quota exceeded".to_string(),
            _ => format!("HTTP {status}"),
        };
        Self::new(source, kind, message).with_status(status)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
            ApiErrorKind::NetworkError
        } else if let Some(status) = err.status() {
            return ApiError::from_status("http", status.as_u16(), "");
        } else {
            ApiErrorKind::Unknown
        };
        ApiError::new("http", kind, err.to_string())
    }
}

fn retry_policy() -> ExponentialBackoff<backoff::SystemClock> {
    ExponentialBackoff {
        current_interval: BASE_DELAY,
        initial_interval: BASE_DELAY,
        max_interval: MAX_DELAY,
        multiplier: 2.0,
        randomization_factor: 0.0,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Run `operation` up to `max_attempts` times, sleeping between attempts on
/// retryable classifications with exponential backoff (1s base, 10s cap).
/// Terminal classifications propagate immediately; exhaustion propagates the
/// last error. Either way the returned error records the attempt count.
pub async fn with_retry<T, F, Fut>(
    source: &str,
    max_attempts: u32,
    mut operation: F,
) -> std::result::Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, ApiError>>,
{
    let mut policy = retry_policy();
    let mut last_error: Option<ApiError> = None;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(mut err) => {
                err.attempts = attempt;
                if !err.kind.is_retryable() || attempt == max_attempts {
                    error!(
                        "{} API failed after {} attempt(s): {} ({})",
                        source,
                        attempt,
                        err.message,
                        err.kind.as_str()
                    );
                    return Err(err);
                }
                let delay = policy.next_backoff().unwrap_or(MAX_DELAY);
                warn!(
                    "{} API attempt {} failed, retrying in {:?}: {}",
                    source, attempt, delay, err.message
                );
                last_error = Some(err);
                tokio::time::sleep(delay).await;
            }
        }
    }

    // Unreachable for max_attempts >= 1; kept as a guard for a zero budget.
    Err(last_error.unwrap_or_else(|| {
        ApiError::new(source, ApiErrorKind::Unknown, "no attempts were made")
    }))
}
