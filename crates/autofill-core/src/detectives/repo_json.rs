use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

use super::repo_files::RepoFiles;
use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::{is_justification_field, is_status_field, justification_field, names, FieldCatalog, MAX_TEXT_LENGTH};
use crate::status::CriterionStatus;

/// Where a project may keep its self-assessment, in lookup order.
pub const FILE_LOCATIONS: &[&str] = &[".bestpractices.json", ".project.d/bestpractices.json"];

/// Larger files are ignored.
pub const MAX_FILE_SIZE: usize = 50_000;

const FROM_FILE: &str = "Value from the project's .bestpractices.json file.";

/// Reads criterion answers the project recorded in its repository.
///
/// Suggest-only: a file in the repository never overrides a stored answer.
pub struct RepoJsonDetective {
    descriptor: DetectiveDescriptor,
}

impl RepoJsonDetective {
    pub const NAME: &'static str = "RepoJsonDetective";

    pub fn new(catalog: &FieldCatalog) -> Self {
        RepoJsonDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_FILES])
                .with_outputs(catalog.criterion_fields())
                .with_overridable_outputs(Vec::<String>::new()),
        }
    }

    async fn read_document(files: &RepoFiles<'_>) -> Option<Map<String, Value>> {
        for path in FILE_LOCATIONS {
            let Some(text) = files.content(path, MAX_FILE_SIZE).await else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            return match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => Some(map),
                Ok(_) => {
                    info!(repo = %files.repo(), path = %path, "Ignoring non-object JSON");
                    None
                }
                Err(err) => {
                    info!(repo = %files.repo(), path = %path, error = %err, "Ignoring invalid JSON");
                    None
                }
            };
        }
        None
    }

    fn convert(&self, document: &Map<String, Value>) -> Changeset {
        let confidence = Confidence::saturating(4);
        let outputs = self.descriptor.outputs();
        let mut changes = Changeset::new();
        let mut paired: BTreeSet<String> = BTreeSet::new();

        for (field, value) in document {
            if !is_status_field(field) || !outputs.contains(field) {
                continue;
            }
            let Some(status) = value
                .as_str()
                .and_then(|v| CriterionStatus::parse_for_automation(v).ok())
            else {
                continue;
            };
            let justification = justification_field(field);
            let explanation = justification
                .as_deref()
                .and_then(|j| document.get(j))
                .and_then(valid_justification)
                .unwrap_or(FROM_FILE);
            changes.propose(field, status.as_str(), confidence, explanation);
            paired.extend(justification);
        }

        for (field, value) in document {
            if !is_justification_field(field) || !outputs.contains(field) || paired.contains(field) {
                continue;
            }
            if let Some(text) = valid_justification(value) {
                changes.propose(field, text, confidence, FROM_FILE);
            }
        }
        changes
    }
}

fn valid_justification(value: &Value) -> Option<&str> {
    let text = value.as_str()?.trim();
    (!text.is_empty() && text.chars().count() <= MAX_TEXT_LENGTH).then_some(text)
}

#[async_trait]
impl Detective for RepoJsonDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let Some(files) = current
            .present(names::REPO_FILES)
            .and_then(|locator| RepoFiles::locate(evidence, locator))
        else {
            return Ok(Changeset::new());
        };
        Ok(match Self::read_document(&files).await {
            Some(document) => self.convert(&document),
            None => Changeset::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_status_with_paired_justification() {
        let d = RepoJsonDetective::new(&FieldCatalog::standard());
        let changes = d.convert(&document(json!({
            "build_status": "met",
            "build_justification": "  We use make.  ",
            "release_notes_status": "?",
            "discussion_status": "maybe",
            "contribution_justification": "See CONTRIBUTING.md",
            "not_a_field_status": "Met",
            "name": "sneaky"
        })));

        let build = changes.get("build_status").unwrap();
        assert_eq!(build.value, "Met");
        assert_eq!(build.confidence.value(), 4);
        assert_eq!(build.explanation.as_deref(), Some("We use make."));
        assert!(!changes.contains("build_justification"));

        assert!(!changes.contains("release_notes_status"));
        assert!(!changes.contains("discussion_status"));
        assert!(!changes.contains("not_a_field_status"));
        assert!(!changes.contains("name"));
        assert_eq!(
            changes.get("contribution_justification").unwrap().value,
            "See CONTRIBUTING.md"
        );
    }

    #[test]
    fn test_missing_or_oversized_justification_uses_default() {
        let d = RepoJsonDetective::new(&FieldCatalog::standard());
        let changes = d.convert(&document(json!({
            "build_status": "Unmet",
            "build_justification": "x".repeat(MAX_TEXT_LENGTH + 1),
            "sites_https_status": "N/A"
        })));
        assert_eq!(changes.get("build_status").unwrap().explanation.as_deref(), Some(FROM_FILE));
        assert_eq!(changes.get("sites_https_status").unwrap().value, "N/A");
        assert!(!changes.contains("build_justification"));
    }

    #[test]
    fn test_suggest_only() {
        let d = RepoJsonDetective::new(&FieldCatalog::standard());
        assert!(d.descriptor().confidence_cap("build_status").value() < 5);
    }
}
