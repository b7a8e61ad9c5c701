//! Contract tests for `EvidenceSource` implementations.
//!
//! Exercised against `MemorySource`; `WebSource` shares the same key grammar
//! and cap rules but needs a network, so only its offline paths are covered
//! in its unit tests.

use std::sync::Arc;

use evidence_source::{EvidenceKey, EvidenceSource, FetchError, MemorySource};
use serde_json::json;

fn source() -> Arc<dyn EvidenceSource> {
    Arc::new(
        MemorySource::new()
            .with_json(
                "github:repo:acme/widget",
                &json!({"name": "widget", "license": {"key": "mit"}}),
            )
            .with_json(
                "github:contents:acme/widget:",
                &json!([{"name": "README.md", "path": "README.md", "type": "file", "size": 120}]),
            )
            .with_text("github:raw:acme/widget:README.md", "# widget"),
    )
}

#[tokio::test]
async fn test_keys_built_with_display_are_served() {
    let source = source();
    let key = EvidenceKey::github_raw("acme/widget", "/README.md").to_string();
    let bytes = source.fetch(&key, 1 << 20).await.unwrap();
    assert_eq!(bytes, b"# widget");
}

#[tokio::test]
async fn test_repo_json_is_parseable() {
    let source = source();
    let bytes = source.fetch("github:repo:acme/widget", 1 << 20).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["license"]["key"], "mit");
}

#[tokio::test]
async fn test_root_listing_key_has_empty_path() {
    let source = source();
    let key = EvidenceKey::github_contents("acme/widget", "/").to_string();
    assert_eq!(key, "github:contents:acme/widget:");
    let bytes = source.fetch(&key, 1 << 20).await.unwrap();
    let listing: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listing.len(), 1);
}

#[tokio::test]
async fn test_unknown_key_is_unsupported() {
    let source = source();
    let err = source.fetch("svn:acme/widget", 1024).await.unwrap_err();
    assert!(matches!(err, FetchError::UnsupportedKey { .. }));
}
