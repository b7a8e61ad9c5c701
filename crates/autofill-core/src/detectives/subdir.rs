use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use super::repo_files::RepoFiles;
use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::names;
use crate::status::CriterionStatus;

/// Largest documentation file read, in bytes.
const MAX_DOC_BYTES: usize = 256 * 1024;

/// Reads the documentation folder and looks for basic topics.
pub struct SubdirFileContentsDetective {
    descriptor: DetectiveDescriptor,
    folder: Regex,
    file: Regex,
    contents: Vec<Regex>,
}

impl SubdirFileContentsDetective {
    pub const NAME: &'static str = "SubdirFileContentsDetective";
    const STATUS: &'static str = "documentation_basics_status";
    const TOPIC: &'static str = "documentation basics";

    pub fn new() -> Result<Self, regex::Error> {
        let ci = |pattern: &str| RegexBuilder::new(pattern).case_insensitive(true).build();
        Ok(SubdirFileContentsDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_FILES])
                .with_outputs([Self::STATUS]),
            folder: ci(r"\Adoc(s|umentation)?\z")?,
            // Text-like extensions, or none at all.
            file: ci(r"\A([^.]+|.*\.(md|markdown|txt|html))\z")?,
            contents: vec![ci(r"install(ation)?")?, ci(r"us(e|ing)")?, ci(r"secur(e|ity)")?],
        })
    }

    fn propose(changes: &mut Changeset, status: CriterionStatus, confidence: u8, explanation: String) {
        changes.propose(
            Self::STATUS,
            status.as_str(),
            Confidence::saturating(confidence),
            explanation,
        );
    }
}

#[async_trait]
impl Detective for SubdirFileContentsDetective {
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
        let Some(folder) = top_level
            .iter()
            .find(|e| e.is_dir() && self.folder.is_match(&e.name))
        else {
            Self::propose(
                &mut changes,
                CriterionStatus::Unmet,
                3,
                format!("No appropriate folder found for {}.", Self::TOPIC),
            );
            return Ok(changes);
        };

        for entry in files.list(&folder.path).await? {
            if !entry.is_file() || !self.file.is_match(&entry.name) {
                continue;
            }
            let Some(text) = files.content(&entry.path, MAX_DOC_BYTES).await else {
                continue;
            };
            if self.contents.iter().any(|pattern| pattern.is_match(&text)) {
                Self::propose(
                    &mut changes,
                    CriterionStatus::Met,
                    3,
                    format!("Some {} file contents found.", Self::TOPIC),
                );
                return Ok(changes);
            }
        }

        Self::propose(
            &mut changes,
            CriterionStatus::Unmet,
            1,
            format!("No {} file(s) found.", Self::TOPIC),
        );
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_and_file_patterns() {
        let d = SubdirFileContentsDetective::new().unwrap();
        for name in ["doc", "Docs", "documentation"] {
            assert!(d.folder.is_match(name), "{name}");
        }
        assert!(!d.folder.is_match("docker"));
        for name in ["index.md", "guide.HTML", "INSTALL", "notes.txt"] {
            assert!(d.file.is_match(name), "{name}");
        }
        for name in ["logo.png", "conf.py"] {
            assert!(!d.file.is_match(name), "{name}");
        }
    }
}
