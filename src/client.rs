use crate::config::HttpConfig;
use crate::retry::ApiError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Thin wrapper around one shared `reqwest::Client`, translating transport
/// failures and non-success statuses into classified `ApiError`s so every
/// adapter speaks the same error taxonomy.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        source: &str,
        url: &str,
        headers: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!("{}: GET {}", source, url);
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        let response = request.send().await.map_err(|e| tag(e.into(), source))?;
        Self::decode(source, response).await
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        source: &str,
        url: &str,
        body: &serde_json::Value,
        headers: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!("{}: POST {}", source, url);
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        let response = request.send().await.map_err(|e| tag(e.into(), source))?;
        Self::decode(source, response).await
    }

    /// Form-encoded POST with optional HTTP basic auth, used by OAuth token
    /// endpoints.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        source: &str,
        url: &str,
        form: &[(&str, &str)],
        basic_auth: Option<(&str, &str)>,
    ) -> Result<T, ApiError> {
        debug!("{}: POST (form) {}", source, url);
        let mut request = self.client.post(url).form(form);
        if let Some((user, password)) = basic_auth {
            request = request.basic_auth(user, Some(password));
        }
        let response = request.send().await.map_err(|e| tag(e.into(), source))?;
        Self::decode(source, response).await
    }

    async fn decode<T: DeserializeOwned>(
        source: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(source, status.as_u16(), &body));
        }
        response.json::<T>().await.map_err(|e| tag(e.into(), source))
    }
}

fn tag(mut err: ApiError, source: &str) -> ApiError {
    err.source = source.to_string();
    err
}
