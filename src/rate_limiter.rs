use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Time source for the limiter. Production uses the system clock; tests
/// inject a manual clock to drive window expiry without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitConfig {
    max_requests: u32,
    window: Duration,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_time: DateTime<Utc>,
}

/// Fixed-window request accounting per source.
///
/// This is advisory local bookkeeping against each upstream's published
/// quota, not a guarantee the upstream won't throttle us anyway; 429s still
/// flow through the retry executor. Entries live behind one async lock so
/// concurrent aggregations update a source's counter atomically.
pub struct RateLimiter {
    limits: HashMap<&'static str, RateLimitConfig>,
    entries: RwLock<HashMap<String, RateLimitEntry>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let mut limits = HashMap::new();
        // Published quotas of each upstream API.
        limits.insert("github", RateLimitConfig { max_requests: 5000, window: Duration::hours(1) });
        limits.insert("gitlab", RateLimitConfig { max_requests: 2000, window: Duration::hours(1) });
        limits.insert("youtube", RateLimitConfig { max_requests: 10_000, window: Duration::days(1) });
        limits.insert("stackoverflow", RateLimitConfig { max_requests: 300, window: Duration::days(1) });
        limits.insert("google", RateLimitConfig { max_requests: 100, window: Duration::days(1) });
        limits.insert("reddit", RateLimitConfig { max_requests: 60, window: Duration::minutes(1) });
        limits.insert("devto", RateLimitConfig { max_requests: 1000, window: Duration::hours(1) });
        limits.insert("medium", RateLimitConfig { max_requests: 100, window: Duration::hours(1) });
        limits.insert("mdn", RateLimitConfig { max_requests: 1000, window: Duration::hours(1) });
        limits.insert("codepen", RateLimitConfig { max_requests: 60, window: Duration::minutes(1) });
        limits.insert("codesandbox", RateLimitConfig { max_requests: 100, window: Duration::hours(1) });
        limits.insert("npm", RateLimitConfig { max_requests: 1000, window: Duration::hours(1) });

        Self {
            limits,
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// True if a request to `source` fits the local budget: no limit
    /// configured, no entry yet, the window has expired, or the count is
    /// still below the maximum.
    pub async fn can_make_request(&self, source: &str) -> bool {
        let Some(limit) = self.limits.get(source) else {
            return true;
        };

        let now = self.clock.now();
        let entries = self.entries.read().await;
        match entries.get(source) {
            None => true,
            Some(entry) if now > entry.reset_time => true,
            Some(entry) => entry.count < limit.max_requests,
        }
    }

    /// Account for one request. Creates a fresh window entry if none exists
    /// or the current window expired, otherwise increments the count.
    pub async fn record_request(&self, source: &str) {
        let Some(limit) = self.limits.get(source) else {
            return;
        };

        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(source) {
            Some(entry) if now <= entry.reset_time => {
                entry.count += 1;
            }
            _ => {
                entries.insert(
                    source.to_string(),
                    RateLimitEntry {
                        count: 1,
                        reset_time: now + limit.window,
                    },
                );
            }
        }
        debug!("recorded request for {}", source);
    }

    /// Requests left in the active window, or `None` when the source has no
    /// configured limit.
    pub async fn remaining(&self, source: &str) -> Option<u32> {
        let limit = self.limits.get(source)?;

        let now = self.clock.now();
        let entries = self.entries.read().await;
        match entries.get(source) {
            None => Some(limit.max_requests),
            Some(entry) if now > entry.reset_time => Some(limit.max_requests),
            Some(entry) => Some(limit.max_requests.saturating_sub(entry.count)),
        }
    }

    /// When the active window resets, if a window is open for the source.
    pub async fn reset_time(&self, source: &str) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().await;
        entries.get(source).map(|entry| entry.reset_time)
    }

    /// Human-readable wait estimate for rate-limit error messages.
    pub async fn wait_estimate(&self, source: &str) -> String {
        match self.reset_time(source).await {
            Some(reset) => {
                let minutes = (reset - self.clock.now()).num_minutes().max(1);
                format!("wait about {minutes} minute(s)")
            }
            None => "try again later".to_string(),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc::now()),
            })
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn unknown_sources_are_unlimited() {
        let limiter = RateLimiter::new();
        assert!(limiter.can_make_request("unheard-of").await);
        limiter.record_request("unheard-of").await;
        assert_eq!(limiter.remaining("unheard-of").await, None);
    }

    #[tokio::test]
    async fn budget_exhausts_and_window_resets() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(clock.clone());

        // Reddit allows 60 per minute.
        for _ in 0..60 {
            assert!(limiter.can_make_request("reddit").await);
            limiter.record_request("reddit").await;
        }
        assert!(!limiter.can_make_request("reddit").await);
        assert_eq!(limiter.remaining("reddit").await, Some(0));

        clock.advance(Duration::seconds(61));
        assert!(limiter.can_make_request("reddit").await);
        assert_eq!(limiter.remaining("reddit").await, Some(60));
    }

    #[tokio::test]
    async fn expired_window_starts_a_fresh_count() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(clock.clone());

        limiter.record_request("codepen").await;
        limiter.record_request("codepen").await;
        assert_eq!(limiter.remaining("codepen").await, Some(58));

        clock.advance(Duration::minutes(2));
        limiter.record_request("codepen").await;
        assert_eq!(limiter.remaining("codepen").await, Some(59));
    }

    #[tokio::test]
    async fn reset_time_tracks_the_open_window() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(clock.clone());

        assert!(limiter.reset_time("github").await.is_none());
        let before = clock.now();
        limiter.record_request("github").await;
        assert_eq!(limiter.reset_time("github").await, Some(before + Duration::hours(1)));
    }
}
