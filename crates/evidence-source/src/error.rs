//! Error types for evidence-source

use thiserror::Error;

/// Ways an evidence fetch can fail.
///
/// None of these escape the evidence cache; they are logged and the key is
/// cached as absent for the rest of the run.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Key does not follow the evidence key grammar
    #[error("Unsupported evidence key: {key}")]
    UnsupportedKey { key: String },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// The fetch did not finish in time
    #[error("Fetch of {key} timed out after {secs}s")]
    Timeout { key: String, secs: u64 },

    /// Remote answered with a non-success status
    #[error("Fetch of {key} returned HTTP {status}")]
    BadStatus { key: String, status: u16 },

    /// Response exceeded the read cap and cannot be truncated meaningfully
    #[error("Fetch of {key} exceeded {limit} bytes")]
    Oversize { key: String, limit: usize },

    /// Response could not be encoded as evidence
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_status_displays_key_and_code() {
        let err = FetchError::BadStatus {
            key: "https://example.com".to_string(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("example.com"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_oversize_displays_limit() {
        let err = FetchError::Oversize {
            key: "github:repo:acme/widget".to_string(),
            limit: 1024,
        };
        assert!(err.to_string().contains("1024"));
    }
}
