//! In-memory evidence source (testing only)
//!
//! `MemorySource` answers keys from a fixed table and counts how often each
//! key was asked for, so tests can assert the cache's fetch-at-most-once
//! behaviour.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::key::EvidenceKey;
use crate::source::EvidenceSource;
use crate::FetchResult;

/// Evidence source backed by a `HashMap<key, bytes>`.
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `key`.
    pub fn with_bytes(mut self, key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(key.to_string(), bytes.into());
        self
    }

    pub fn with_text(self, key: &str, text: &str) -> Self {
        self.with_bytes(key, text.as_bytes())
    }

    pub fn with_json(self, key: &str, value: &Value) -> Self {
        self.with_bytes(key, value.to_string())
    }

    /// Fail every fetch of `key` with a network error.
    pub fn with_failure(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Sleep before answering, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `key` was fetched.
    pub fn fetch_count(&self, key: &str) -> usize {
        self.counts().get(key).copied().unwrap_or(0)
    }

    /// Fetches across all keys.
    pub fn total_fetches(&self) -> usize {
        self.counts().values().sum()
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        self.fetches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EvidenceSource for MemorySource {
    async fn fetch(&self, key: &str, max_bytes: usize) -> FetchResult<Vec<u8>> {
        *self.counts().entry(key.to_string()).or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let parsed = EvidenceKey::parse(key)?;
        if self.failing.contains(key) {
            return Err(FetchError::Network(format!("injected failure for {key}")));
        }

        let Some(bytes) = self.entries.get(key) else {
            return match parsed {
                EvidenceKey::GithubContents { .. } => Ok(b"[]".to_vec()),
                _ => Err(FetchError::BadStatus {
                    key: key.to_string(),
                    status: 404,
                }),
            };
        };

        if bytes.len() > max_bytes {
            if !parsed.truncates() {
                return Err(FetchError::Oversize {
                    key: key.to_string(),
                    limit: max_bytes,
                });
            }
            return Ok(bytes[..max_bytes].to_vec());
        }
        Ok(bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_entries_and_counts() {
        let source = MemorySource::new().with_text("https://a.example/", "hello");
        assert_eq!(source.fetch("https://a.example/", 1024).await.unwrap(), b"hello");
        assert_eq!(source.fetch("https://a.example/", 1024).await.unwrap(), b"hello");
        assert_eq!(source.fetch_count("https://a.example/"), 2);
        assert_eq!(source.total_fetches(), 2);
    }

    #[tokio::test]
    async fn test_missing_contents_is_empty_listing() {
        let source = MemorySource::new();
        let listing = source
            .fetch("github:contents:acme/widget:docs", 1024)
            .await
            .unwrap();
        assert_eq!(listing, b"[]");
    }

    #[tokio::test]
    async fn test_missing_body_is_404() {
        let source = MemorySource::new();
        let err = source.fetch("https://nowhere.example/", 1024).await.unwrap_err();
        assert!(matches!(err, FetchError::BadStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_cap_truncates_bodies_and_rejects_structured() {
        let source = MemorySource::new()
            .with_text("https://a.example/", "0123456789")
            .with_text("github:repo:acme/widget", r#"{"name":"widget"}"#);

        assert_eq!(source.fetch("https://a.example/", 4).await.unwrap(), b"0123");
        let err = source.fetch("github:repo:acme/widget", 4).await.unwrap_err();
        assert!(matches!(err, FetchError::Oversize { limit: 4, .. }));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = MemorySource::new()
            .with_text("https://a.example/", "x")
            .with_failure("https://a.example/");
        let err = source.fetch("https://a.example/", 16).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied_per_fetch() {
        let source = MemorySource::new()
            .with_text("https://a.example/", "x")
            .with_delay(Duration::from_secs(30));

        let start = tokio::time::Instant::now();
        source.fetch("https://a.example/", 16).await.unwrap();
        source.fetch("https://a.example/", 16).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
