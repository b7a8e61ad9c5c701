//! HTTP evidence source
//!
//! Serves plain URLs, response headers and the GitHub REST API through a
//! single `reqwest` client with a per-request timeout.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::FetchError;
use crate::key::EvidenceKey;
use crate::source::EvidenceSource;
use crate::FetchResult;

const GITHUB_JSON: &str = "application/vnd.github+json";
const GITHUB_RAW: &str = "application/vnd.github.raw+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Web source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSourceConfig {
    /// Base URL of the GitHub REST API
    pub github_api: String,
    /// Token for authenticated GitHub requests (optional)
    pub github_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for WebSourceConfig {
    fn default() -> Self {
        WebSourceConfig {
            github_api: std::env::var("AUTOFILL_GITHUB_API")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            github_token: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            timeout_secs: std::env::var("AUTOFILL_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            user_agent: format!("badge-autofill/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl WebSourceConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Point GitHub requests at a different API base (e.g. GitHub Enterprise)
    pub fn with_github_api(mut self, url: &str) -> Self {
        self.github_api = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the GitHub token
    pub fn with_token(mut self, token: &str) -> Self {
        self.github_token = Some(token.to_string());
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Evidence source backed by HTTP(S) and the GitHub REST API.
pub struct WebSource {
    config: WebSourceConfig,
    http_client: reqwest::Client,
}

impl WebSource {
    /// Create a new web source
    pub fn new(config: WebSourceConfig) -> FetchResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(WebSource {
            config,
            http_client,
        })
    }

    /// Create a source from environment variables
    pub fn from_env() -> FetchResult<Self> {
        Self::new(WebSourceConfig::from_env())
    }

    pub fn config(&self) -> &WebSourceConfig {
        &self.config
    }

    fn github_request(&self, path: &str, accept: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.github_api.trim_end_matches('/'), path);
        let request = self
            .http_client
            .get(url)
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        match &self.config.github_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, key: &EvidenceKey, request: RequestBuilder) -> FetchResult<Response> {
        request.send().await.map_err(|e| self.classify(key, e))
    }

    fn classify(&self, key: &EvidenceKey, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                key: key.to_string(),
                secs: self.config.timeout_secs,
            }
        } else {
            FetchError::from(err)
        }
    }

    /// Stream the body, stopping at `max_bytes`.
    async fn read_capped(
        &self,
        key: &EvidenceKey,
        response: Response,
        max_bytes: usize,
    ) -> FetchResult<Vec<u8>> {
        let oversize = || FetchError::Oversize {
            key: key.to_string(),
            limit: max_bytes,
        };

        if !key.truncates() {
            if let Some(len) = response.content_length() {
                if len > max_bytes as u64 {
                    return Err(oversize());
                }
            }
        }

        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.classify(key, e))?;
            let room = max_bytes - body.len();
            if chunk.len() > room {
                if !key.truncates() {
                    return Err(oversize());
                }
                body.extend_from_slice(&chunk[..room]);
                debug!(key = %key, limit = max_bytes, "Truncated evidence body");
                return Ok(body);
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn check_status(key: &EvidenceKey, response: &Response) -> FetchResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FetchError::BadStatus {
                key: key.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl EvidenceSource for WebSource {
    async fn fetch(&self, key: &str, max_bytes: usize) -> FetchResult<Vec<u8>> {
        let parsed = EvidenceKey::parse(key)?;
        debug!(key = %parsed, "Fetching evidence");

        match &parsed {
            EvidenceKey::Body { url } => {
                let response = self.send(&parsed, self.http_client.get(url)).await?;
                Self::check_status(&parsed, &response)?;
                self.read_capped(&parsed, response, max_bytes).await
            }
            EvidenceKey::Headers { url } => {
                let response = self.send(&parsed, self.http_client.get(url)).await?;
                Self::check_status(&parsed, &response)?;
                let encoded = serde_json::to_vec(&headers_to_json(response.headers()))?;
                if encoded.len() > max_bytes {
                    return Err(FetchError::Oversize {
                        key: parsed.to_string(),
                        limit: max_bytes,
                    });
                }
                Ok(encoded)
            }
            EvidenceKey::GithubRepo { repo } => {
                let request = self.github_request(&format!("repos/{repo}"), GITHUB_JSON);
                let response = self.send(&parsed, request).await?;
                Self::check_status(&parsed, &response)?;
                self.read_capped(&parsed, response, max_bytes).await
            }
            EvidenceKey::GithubContents { repo, path } => {
                let request = self.github_request(&contents_path(repo, path), GITHUB_JSON);
                let response = self.send(&parsed, request).await?;
                if response.status() == StatusCode::NOT_FOUND {
                    // Missing directory: an empty listing, not a failure.
                    return Ok(b"[]".to_vec());
                }
                Self::check_status(&parsed, &response)?;
                self.read_capped(&parsed, response, max_bytes).await
            }
            EvidenceKey::GithubRaw { repo, path } => {
                let request = self.github_request(&contents_path(repo, path), GITHUB_RAW);
                let response = self.send(&parsed, request).await?;
                Self::check_status(&parsed, &response)?;
                self.read_capped(&parsed, response, max_bytes).await
            }
        }
    }
}

fn contents_path(repo: &str, path: &str) -> String {
    if path.is_empty() {
        format!("repos/{repo}/contents")
    } else {
        format!("repos/{repo}/contents/{path}")
    }
}

/// Header names are already lower-case in `http`; repeated headers are
/// joined with `", "`.
fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_ascii_lowercase(), Value::String(joined));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_config_builders() {
        let config = WebSourceConfig::default()
            .with_github_api("https://ghe.example.com/api/v3/")
            .with_token("t0ken")
            .with_timeout_secs(3);
        assert_eq!(config.github_api, "https://ghe.example.com/api/v3");
        assert_eq!(config.github_token.as_deref(), Some("t0ken"));
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_contents_path_for_root_and_subdir() {
        assert_eq!(contents_path("acme/widget", ""), "repos/acme/widget/contents");
        assert_eq!(
            contents_path("acme/widget", "docs/install.md"),
            "repos/acme/widget/contents/docs/install.md"
        );
    }

    #[test]
    fn test_headers_to_json_joins_repeats() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let json = headers_to_json(&headers);
        assert_eq!(json["x-frame-options"], "DENY");
        assert_eq!(json["set-cookie"], "a=1, b=2");
    }

    #[tokio::test]
    async fn test_unsupported_key_fails_without_network() {
        let source = WebSource::new(WebSourceConfig::default()).unwrap();
        let err = source.fetch("gopher://example.org", 1024).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedKey { .. }));
    }
}
