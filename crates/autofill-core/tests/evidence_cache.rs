//! Per-run evidence cache behaviour under repetition and contention.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autofill_core::Evidence;
use evidence_source::{EvidenceSource, FetchResult, MemorySource};
use futures::future::join_all;

const KEY: &str = "https://widget.example.org/";

#[tokio::test(start_paused = true)]
async fn test_concurrent_gets_fetch_once() {
    let source = Arc::new(
        MemorySource::new()
            .with_text(KEY, "<html>widget</html>")
            .with_delay(Duration::from_millis(20)),
    );
    let evidence = Evidence::new(source.clone(), 1024);

    let results = join_all((0..8).map(|_| evidence.get(KEY))).await;

    assert!(results.iter().all(|r| r.as_deref() == Some(&b"<html>widget</html>"[..])));
    assert_eq!(source.fetch_count(KEY), 1);
}

#[tokio::test]
async fn test_failures_are_cached_as_absent() {
    let source = Arc::new(MemorySource::new().with_failure(KEY));
    let evidence = Evidence::new(source.clone(), 1024);

    assert!(evidence.get(KEY).await.is_none());
    assert!(evidence.get(KEY).await.is_none());
    assert_eq!(source.fetch_count(KEY), 1);
}

#[tokio::test]
async fn test_unknown_key_is_absent() {
    let evidence = Evidence::new(Arc::new(MemorySource::new()), 1024);
    assert!(evidence.get("ftp://widget.example.org").await.is_none());
}

#[tokio::test]
async fn test_body_truncated_structured_dropped() {
    let source = Arc::new(
        MemorySource::new()
            .with_text(KEY, "0123456789")
            .with_text("github:repo:acme/widget", "{\"name\": \"widget\"}"),
    );
    let evidence = Evidence::new(source, 4);

    assert_eq!(evidence.get_text(KEY).await.as_deref(), Some("0123"));
    assert!(evidence.get("github:repo:acme/widget").await.is_none());
    assert_eq!(evidence.requested_keys(), 2);
}

#[tokio::test]
async fn test_each_run_starts_empty() {
    let source = Arc::new(MemorySource::new().with_text(KEY, "x"));
    for _ in 0..2 {
        let evidence = Evidence::new(source.clone(), 1024);
        evidence.get(KEY).await;
    }
    assert_eq!(source.fetch_count(KEY), 2);
}

/// Returns the same payload whatever cap it is given.
struct Uncapped(&'static [u8]);

#[async_trait]
impl EvidenceSource for Uncapped {
    async fn fetch(&self, _key: &str, _max_bytes: usize) -> FetchResult<Vec<u8>> {
        Ok(self.0.to_vec())
    }
}

#[tokio::test]
async fn test_cap_holds_for_sources_that_ignore_it() {
    let evidence = Evidence::new(Arc::new(Uncapped(&[b'x'; 100])), 10);

    assert_eq!(evidence.get(KEY).await.map(|b| b.len()), Some(10));
    assert!(evidence.get("github:repo:acme/widget").await.is_none());
    assert!(evidence.get("head:https://widget.example.org/").await.is_none());
}
