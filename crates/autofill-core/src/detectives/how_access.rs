use async_trait::async_trait;
use regex::Regex;

use super::repo_files::locator;
use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::names;

/// Works out how repository files can be read and publishes the locator
/// as `repo_files`.
pub struct HowAccessRepoFilesDetective {
    descriptor: DetectiveDescriptor,
    github_repo: Regex,
}

impl HowAccessRepoFilesDetective {
    pub const NAME: &'static str = "HowAccessRepoFilesDetective";

    pub fn new() -> Result<Self, regex::Error> {
        Ok(HowAccessRepoFilesDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_URL])
                .with_outputs([names::REPO_FILES]),
            github_repo: Regex::new(r"https?://github\.com/([\w.-]+)/([\w.-]+)")?,
        })
    }

    fn locate(&self, repo_url: &str) -> Option<String> {
        let caps = self.github_repo.captures(repo_url)?;
        let owner = &caps[1];
        let name = caps[2].strip_suffix(".git").unwrap_or(&caps[2]);
        (!name.is_empty()).then(|| locator(owner, name))
    }
}

#[async_trait]
impl Detective for HowAccessRepoFilesDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, _evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        if let Some(found) = current.present(names::REPO_URL).and_then(|url| self.locate(url)) {
            changes.propose(
                names::REPO_FILES,
                found,
                Confidence::MAX,
                "Repository files are readable through the GitHub API.",
            );
        }
        Ok(changes)
    }
}
