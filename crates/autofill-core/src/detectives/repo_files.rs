//! Repository file access for detectives that consume `repo_files`.
//!
//! The `repo_files` field carries a locator (`github:<owner>/<name>`), not
//! the files themselves. [`RepoFiles`] resolves it against the run's
//! evidence cache, so every listing and file body is fetched once per run.

use evidence_source::EvidenceKey;
use serde::Deserialize;

use crate::error::{DetectiveError, DetectiveResult};
use crate::evidence::Evidence;

const LOCATOR_PREFIX: &str = "github:";

/// Locator value for a GitHub repository.
pub fn locator(owner: &str, name: &str) -> String {
    format!("{LOCATOR_PREFIX}{owner}/{name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a contents listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl RepoEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// File accessor bound to one repository and one run's evidence.
pub struct RepoFiles<'a> {
    evidence: &'a Evidence,
    repo: String,
}

impl<'a> RepoFiles<'a> {
    /// Resolve a `repo_files` locator. Unknown locators yield `None`.
    pub fn locate(evidence: &'a Evidence, locator: &str) -> Option<Self> {
        let repo = locator.trim().strip_prefix(LOCATOR_PREFIX)?;
        let (owner, name) = repo.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(RepoFiles {
            evidence,
            repo: repo.to_string(),
        })
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Entries of the directory at `path` (`""` or `"/"` is the root).
    ///
    /// Missing evidence lists nothing; evidence that is not a listing is
    /// malformed.
    pub async fn list(&self, path: &str) -> DetectiveResult<Vec<RepoEntry>> {
        let key = EvidenceKey::github_contents(self.repo.as_str(), path).to_string();
        let Some(bytes) = self.evidence.get(&key).await else {
            return Ok(Vec::new());
        };
        serde_json::from_slice(&bytes).map_err(|err| DetectiveError::MalformedEvidence {
            key,
            reason: err.to_string(),
        })
    }

    /// The top-level entry named `name`, if any.
    pub async fn top_level(&self, name: &str) -> DetectiveResult<Option<RepoEntry>> {
        Ok(self
            .list("")
            .await?
            .into_iter()
            .find(|entry| entry.name == name))
    }

    /// Raw content of the file at `path`, decoded lossily.
    ///
    /// Returns `None` when unavailable or larger than `max_bytes`.
    pub async fn content(&self, path: &str, max_bytes: usize) -> Option<String> {
        let key = EvidenceKey::github_raw(self.repo.as_str(), path).to_string();
        let bytes = self.evidence.get(&key).await?;
        if bytes.len() > max_bytes {
            return None;
        }
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}
