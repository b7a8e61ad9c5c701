//! Evidence key grammar.
//!
//! | Key                                  | Evidence                              |
//! |--------------------------------------|---------------------------------------|
//! | `https://…`, `http://…`              | response body (truncated at the cap)  |
//! | `head:<url>`                         | response headers as a JSON object     |
//! | `github:repo:<owner>/<name>`         | GitHub repository JSON                |
//! | `github:contents:<owner>/<name>:<p>` | GitHub contents JSON (dir or file)    |
//! | `github:raw:<owner>/<name>:<p>`      | raw file bytes                        |

use std::fmt;

use crate::error::FetchError;
use crate::FetchResult;

/// A parsed evidence key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EvidenceKey {
    /// Body of an HTTP(S) resource.
    Body { url: String },
    /// Response headers of an HTTP(S) resource.
    Headers { url: String },
    /// Repository metadata from the GitHub API.
    GithubRepo { repo: String },
    /// Contents API entry for a path (`""` is the repository root).
    GithubContents { repo: String, path: String },
    /// Raw bytes of a file in the repository.
    GithubRaw { repo: String, path: String },
}

impl EvidenceKey {
    pub fn body(url: impl Into<String>) -> Self {
        Self::Body { url: url.into() }
    }

    pub fn headers(url: impl Into<String>) -> Self {
        Self::Headers { url: url.into() }
    }

    pub fn github_repo(repo: impl Into<String>) -> Self {
        Self::GithubRepo { repo: repo.into() }
    }

    pub fn github_contents(repo: impl Into<String>, path: &str) -> Self {
        Self::GithubContents {
            repo: repo.into(),
            path: normalize_path(path),
        }
    }

    pub fn github_raw(repo: impl Into<String>, path: &str) -> Self {
        Self::GithubRaw {
            repo: repo.into(),
            path: normalize_path(path),
        }
    }

    /// Parse a key string. Unknown shapes are a [`FetchError::UnsupportedKey`].
    pub fn parse(key: &str) -> FetchResult<Self> {
        let unsupported = || FetchError::UnsupportedKey {
            key: key.to_string(),
        };

        if is_http_url(key) {
            return Ok(Self::body(key));
        }
        if let Some(url) = key.strip_prefix("head:") {
            return if is_http_url(url) {
                Ok(Self::headers(url))
            } else {
                Err(unsupported())
            };
        }
        if let Some(repo) = key.strip_prefix("github:repo:") {
            return if is_repo_name(repo) {
                Ok(Self::github_repo(repo))
            } else {
                Err(unsupported())
            };
        }
        if let Some(rest) = key.strip_prefix("github:contents:") {
            let (repo, path) = rest.split_once(':').unwrap_or((rest, ""));
            return if is_repo_name(repo) {
                Ok(Self::github_contents(repo, path))
            } else {
                Err(unsupported())
            };
        }
        if let Some(rest) = key.strip_prefix("github:raw:") {
            let (repo, path) = rest.split_once(':').ok_or_else(unsupported)?;
            return if is_repo_name(repo) && !normalize_path(path).is_empty() {
                Ok(Self::github_raw(repo, path))
            } else {
                Err(unsupported())
            };
        }
        Err(unsupported())
    }

    /// Whether a response larger than the cap may be cut short instead of
    /// failing. Only plain bodies qualify; structured responses would be
    /// corrupted by truncation.
    pub fn truncates(&self) -> bool {
        matches!(self, Self::Body { .. })
    }
}

impl fmt::Display for EvidenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body { url } => write!(f, "{url}"),
            Self::Headers { url } => write!(f, "head:{url}"),
            Self::GithubRepo { repo } => write!(f, "github:repo:{repo}"),
            Self::GithubContents { repo, path } => write!(f, "github:contents:{repo}:{path}"),
            Self::GithubRaw { repo, path } => write!(f, "github:raw:{repo}:{path}"),
        }
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

/// `owner/name`, each part non-empty and free of separators.
fn is_repo_name(s: &str) -> bool {
    let mut parts = s.split('/');
    let valid = |p: Option<&str>| {
        p.is_some_and(|p| {
            !p.is_empty()
                && p
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
    };
    valid(parts.next()) && valid(parts.next()) && parts.next().is_none()
}

fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_url_is_body() {
        assert_eq!(
            EvidenceKey::parse("https://example.org/").unwrap(),
            EvidenceKey::body("https://example.org/")
        );
    }

    #[test]
    fn test_parse_contents_root_and_subdir() {
        assert_eq!(
            EvidenceKey::parse("github:contents:acme/widget:/").unwrap(),
            EvidenceKey::github_contents("acme/widget", "")
        );
        assert_eq!(
            EvidenceKey::parse("github:contents:acme/widget:docs/").unwrap(),
            EvidenceKey::github_contents("acme/widget", "docs")
        );
    }

    #[test]
    fn test_display_matches_parse() {
        let key = EvidenceKey::github_raw("acme/widget", ".project.d/bestpractices.json");
        assert_eq!(EvidenceKey::parse(&key.to_string()).unwrap(), key);
    }

    #[test]
    fn test_rejects_malformed_keys() {
        for key in [
            "ftp://example.org",
            "head:file:///etc/passwd",
            "github:repo:acme",
            "github:repo:acme/widget/extra",
            "github:raw:acme/widget:",
            "github:repo:ac me/widget",
            "",
        ] {
            assert!(
                matches!(
                    EvidenceKey::parse(key),
                    Err(FetchError::UnsupportedKey { .. })
                ),
                "expected {key:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_only_bodies_truncate() {
        assert!(EvidenceKey::body("https://a.example").truncates());
        assert!(!EvidenceKey::github_repo("acme/widget").truncates());
        assert!(!EvidenceKey::headers("https://a.example").truncates());
    }
}
