//! Override policy and commit of a changeset into a project record.

use std::collections::BTreeMap;

use project_state::{FieldUpdate, ProjectRecord, StateResult};
use serde::{Deserialize, Serialize};

use crate::changeset::{Changeset, Confidence, OVERRIDE_THRESHOLD};
use crate::fields::{is_status_field, justification_field, FieldCatalog, MAX_TEXT_LENGTH};
use crate::status::CriterionStatus;

/// One write performed (or planned) by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: String,
    /// Confidence of the proposal that caused the write.
    pub confidence: Confidence,
}

/// Should `field` be written from `changeset`?
///
/// Only when a proposal exists and either the stored value carries no
/// information (absent, blank, or the unknown sentinel) or the proposal
/// reaches [`OVERRIDE_THRESHOLD`].
pub fn should_update<P: ProjectRecord + ?Sized>(
    project: &P,
    field: &str,
    changeset: &Changeset,
) -> bool {
    let Some(proposal) = changeset.get(field) else {
        return false;
    };
    match project.get(field) {
        None => true,
        Some(stored) => {
            stored.trim().is_empty()
                || is_unknown_sentinel(&stored)
                || proposal.confidence >= OVERRIDE_THRESHOLD
        }
    }
}

fn is_unknown_sentinel(value: &str) -> bool {
    matches!(CriterionStatus::parse(value), Ok(CriterionStatus::Unknown))
}

/// `existing` with `explanation` appended, or `None` when nothing changes.
///
/// An explanation that is already a suffix is not repeated, and text that
/// would exceed [`MAX_TEXT_LENGTH`] keeps the existing justification.
pub fn append_justification(existing: Option<&str>, explanation: &str) -> Option<String> {
    let explanation = explanation.trim();
    if explanation.is_empty() {
        return None;
    }
    match existing.map(str::trim_end).filter(|e| !e.trim().is_empty()) {
        None => Some(explanation.to_string()),
        Some(existing) if existing.ends_with(explanation) => None,
        Some(existing) => {
            let combined = format!("{existing} {explanation}");
            (combined.chars().count() <= MAX_TEXT_LENGTH).then_some(combined)
        }
    }
}

/// Compute the writes a commit would perform, without touching `project`.
///
/// Fields outside `catalog` are never written, nor are writes that would
/// store the value already present.
pub fn plan_commit<P: ProjectRecord + ?Sized>(
    project: &P,
    changeset: &Changeset,
    catalog: &FieldCatalog,
) -> Vec<FieldChange> {
    // Values already planned in this commit, by field.
    let mut pending: BTreeMap<String, usize> = BTreeMap::new();
    let mut changes: Vec<FieldChange> = Vec::new();

    let mut stage = |changes: &mut Vec<FieldChange>, change: FieldChange| {
        if change.old_value.as_deref() == Some(change.new_value.as_str()) {
            return;
        }
        match pending.get(&change.field) {
            Some(&idx) => changes[idx].new_value = change.new_value,
            None => {
                pending.insert(change.field.clone(), changes.len());
                changes.push(change);
            }
        }
    };

    for (field, proposal) in changeset {
        if !catalog.is_writable(field) || !should_update(project, field, changeset) {
            continue;
        }
        let old_value = project.get(field);
        stage(
            &mut changes,
            FieldChange {
                field: field.clone(),
                old_value,
                new_value: proposal.value.clone(),
                confidence: proposal.confidence,
            },
        );

        let Some(explanation) = proposal.explanation.as_deref() else {
            continue;
        };
        if !is_status_field(field) {
            continue;
        }
        let Some(just_field) = justification_field(field) else {
            continue;
        };
        if !catalog.is_writable(&just_field) {
            continue;
        }

        let stored = project.get(&just_field);
        let current = changes
            .iter()
            .find(|c| c.field == just_field)
            .map(|c| c.new_value.clone())
            .or_else(|| stored.clone());
        if let Some(appended) = append_justification(current.as_deref(), explanation) {
            stage(
                &mut changes,
                FieldChange {
                    field: just_field,
                    old_value: stored,
                    new_value: appended,
                    confidence: proposal.confidence,
                },
            );
        }
    }
    changes
}

/// Apply `changeset` to `project` as one batch and return what changed.
pub fn apply_changes<P: ProjectRecord + ?Sized>(
    project: &mut P,
    changeset: &Changeset,
    catalog: &FieldCatalog,
) -> StateResult<Vec<FieldChange>> {
    let changes = plan_commit(&*project, changeset, catalog);
    if changes.is_empty() {
        return Ok(changes);
    }
    let updates: Vec<FieldUpdate> = changes
        .iter()
        .map(|c| FieldUpdate::new(c.field.clone(), c.new_value.clone()))
        .collect();
    project.apply(&updates)?;
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::Proposal;
    use project_state::MemoryProject;

    fn changeset(field: &str, value: &str, confidence: u8, explanation: Option<&str>) -> Changeset {
        let mut proposal = Proposal::new(value, Confidence::new(confidence).unwrap());
        proposal.explanation = explanation.map(str::to_string);
        [(field.to_string(), proposal)].into_iter().collect()
    }

    #[test]
    fn test_should_update_requires_proposal() {
        let project = MemoryProject::new();
        assert!(!should_update(&project, "license", &Changeset::new()));
    }

    #[test]
    fn test_should_update_fills_blank_and_unknown() {
        let cs = changeset("build_status", "Met", 1, None);
        for stored in ["", "  ", "?", "unknown"] {
            let project = MemoryProject::new().with_field("build_status", stored);
            assert!(should_update(&project, "build_status", &cs), "stored {stored:?}");
        }
        assert!(should_update(&MemoryProject::new(), "build_status", &cs));
    }

    #[test]
    fn test_should_update_needs_threshold_to_override() {
        let project = MemoryProject::new().with_field("build_status", "Met");
        assert!(!should_update(&project, "build_status", &changeset("build_status", "Unmet", 4, None)));
        assert!(should_update(&project, "build_status", &changeset("build_status", "Unmet", 5, None)));
    }

    #[test]
    fn test_append_justification() {
        assert_eq!(append_justification(None, "Found Makefile."), Some("Found Makefile.".into()));
        assert_eq!(append_justification(Some("  "), "x"), Some("x".into()));
        assert_eq!(append_justification(Some("We build. Found Makefile."), "Found Makefile."), None);
        assert_eq!(
            append_justification(Some("We build."), "Found Makefile."),
            Some("We build. Found Makefile.".into())
        );
        let long = "y".repeat(MAX_TEXT_LENGTH);
        assert_eq!(append_justification(Some(&long), "more"), None);
    }

    #[test]
    fn test_commit_skips_uncatalogued_and_identical() {
        let mut project = MemoryProject::new().with_field("name", "widget");
        let mut cs = changeset("repo_files", "github:acme/widget", 5, None);
        cs.insert("name", Proposal::new("widget", Confidence::MAX));
        let changes = apply_changes(&mut project, &cs, &FieldCatalog::standard()).unwrap();
        assert!(changes.is_empty());
        assert_eq!(project.write_count(), 0);
    }

    #[test]
    fn test_commit_writes_status_and_justification() {
        let mut project = MemoryProject::new();
        let cs = changeset("build_status", "Met", 3, Some("Non-trivial build file."));
        let changes = apply_changes(&mut project, &cs, &FieldCatalog::standard()).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(project.get("build_status").as_deref(), Some("Met"));
        assert_eq!(
            project.get("build_justification").as_deref(),
            Some("Non-trivial build file.")
        );
    }

    #[test]
    fn test_direct_justification_then_status_explanation_combine() {
        let mut project = MemoryProject::new();
        let mut cs = changeset("build_status", "Met", 3, Some("Makefile present."));
        cs.insert(
            "build_justification",
            Proposal::new("We use make.", Confidence::saturating(3)),
        );
        apply_changes(&mut project, &cs, &FieldCatalog::standard()).unwrap();
        assert_eq!(
            project.get("build_justification").as_deref(),
            Some("We use make. Makefile present.")
        );
    }
}
