use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use super::repo_files::{RepoEntry, RepoFiles};
use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::names;
use crate::status::CriterionStatus;

struct FileRule {
    status: &'static str,
    pattern: Regex,
    min_size: u64,
    description: &'static str,
}

/// Looks for non-trivial contribution and changelog files at the top level.
pub struct RepoFilesExamineDetective {
    descriptor: DetectiveDescriptor,
    rules: Vec<FileRule>,
}

impl RepoFilesExamineDetective {
    pub const NAME: &'static str = "RepoFilesExamineDetective";

    pub fn new() -> Result<Self, regex::Error> {
        let rule = |status, pattern: &str, min_size, description| -> Result<FileRule, regex::Error> {
            Ok(FileRule {
                status,
                pattern: RegexBuilder::new(pattern).case_insensitive(true).build()?,
                min_size,
                description,
            })
        };
        let rules = vec![
            rule(
                "contribution_status",
                r"\A(contributing|contribute)(\.md|\.txt)?\z",
                100,
                "contribution",
            )?,
            rule("release_notes_status", r"\Achangelog(\.md|\.txt)?\z", 40, "changelog")?,
        ];
        Ok(RepoFilesExamineDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_FILES])
                .with_outputs(rules.iter().map(|r| r.status)),
            rules,
        })
    }

    fn judge(rule: &FileRule, top_level: &[RepoEntry], changes: &mut Changeset) {
        let found = top_level
            .iter()
            .find(|e| e.is_file() && rule.pattern.is_match(&e.name) && e.size >= rule.min_size);
        match found {
            Some(entry) => changes.propose(
                rule.status,
                CriterionStatus::Met.as_str(),
                Confidence::saturating(3),
                format!(
                    "Non-trivial {} file in repository: <{}>.",
                    rule.description,
                    entry.html_url.as_deref().unwrap_or(&entry.path)
                ),
            ),
            None => changes.propose(
                rule.status,
                CriterionStatus::Unmet.as_str(),
                Confidence::MIN,
                format!("No {} file found.", rule.description),
            ),
        }
    }
}

#[async_trait]
impl Detective for RepoFilesExamineDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        let Some(files) = current
            .present(names::REPO_FILES)
            .and_then(|locator| RepoFiles::locate(evidence, locator))
        else {
            return Ok(changes);
        };

        let top_level = files.list("").await?;
        for rule in &self.rules {
            Self::judge(rule, &top_level, &mut changes);
        }
        Ok(changes)
    }
}
