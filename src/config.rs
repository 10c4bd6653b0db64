use std::env;
use tracing::warn;

/// Credential plus base URL for one upstream API. Every credential is
/// independently optional: adapters degrade to unauthenticated access where
/// the upstream allows it and report "not configured" where it doesn't.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl SourceConfig {
    fn new(key_var: &str, base_url: &str) -> Self {
        Self {
            api_key: env_credential(key_var),
            base_url: base_url.to_string(),
        }
    }
}

/// Google Custom Search needs a key and a search-engine id together.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub base_url: String,
}

/// Reddit uses an OAuth client-credentials pair and a separate token URL.
#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: String,
    pub token_url: String,
}

/// HTTP client behavior shared by every adapter.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "DevAssist/1.0".to_string(),
            timeout_seconds: 15,
            max_redirects: 5,
        }
    }
}

/// Per-source configuration for all upstream APIs, read from the
/// environment. Base URLs default to the published endpoints and are
/// overridable in tests.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub http: HttpConfig,
    pub github: SourceConfig,
    pub gitlab: SourceConfig,
    pub npm: SourceConfig,
    pub youtube: SourceConfig,
    pub stackoverflow: SourceConfig,
    pub mdn: SourceConfig,
    pub google: GoogleConfig,
    pub reddit: RedditConfig,
    pub devto: SourceConfig,
    pub medium: SourceConfig,
    pub codesandbox: SourceConfig,
    pub codepen: SourceConfig,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            http: HttpConfig::default(),
            github: SourceConfig::new("GITHUB_API_KEY", "https://api.github.com"),
            gitlab: SourceConfig::new("GITLAB_API_KEY", "https://gitlab.com/api/v4"),
            npm: SourceConfig::new("NPM_API_KEY", "https://registry.npmjs.org"),
            youtube: SourceConfig::new("YOUTUBE_API_KEY", "https://www.googleapis.com/youtube/v3"),
            stackoverflow: SourceConfig::new(
                "STACKOVERFLOW_API_KEY",
                "https://api.stackexchange.com/2.3",
            ),
            mdn: SourceConfig::new("MDN_API_KEY", "https://developer.mozilla.org"),
            google: GoogleConfig {
                api_key: env_credential("GOOGLE_API_KEY"),
                search_engine_id: env_credential("GOOGLE_SEARCH_ENGINE_ID"),
                base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            },
            reddit: RedditConfig {
                client_id: env_credential("REDDIT_CLIENT_ID"),
                client_secret: env_credential("REDDIT_CLIENT_SECRET"),
                base_url: "https://oauth.reddit.com".to_string(),
                token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            },
            devto: SourceConfig::new("DEVTO_API_KEY", "https://dev.to/api"),
            medium: SourceConfig::new("MEDIUM_API_KEY", "https://api.medium.com/v1"),
            codesandbox: SourceConfig::new("CODESANDBOX_API_KEY", "https://codesandbox.io/api"),
            codepen: SourceConfig::new("CODEPEN_API_KEY", "https://codepen.io"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Read a credential from the environment, treating template values left in
/// a copied .env file ("your_key_here" and friends) as unset.
fn env_credential(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(value)
            if !value.is_empty()
                && !value.contains("your_")
                && !value.contains("here")
                && !value.contains("placeholder") =>
        {
            Some(value)
        }
        Ok(_) => {
            warn!("{} looks like a template value, treating as unset", var);
            None
        }
        Err(_) => None,
    }
}
