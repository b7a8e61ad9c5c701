//! Proposals, changesets and the confidence-based merge.
//!
//! Wire shape (used at every boundary):
//!
//! ```json
//! { "license": { "value": "MIT", "confidence": 3, "explanation": "..." } }
//! ```

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confidence outside the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("confidence {0} outside 1..=5")]
pub struct ConfidenceError(pub u8);

/// Trust in a proposal, 1 (guess) to 5 (certain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: Confidence = Confidence(1);
    pub const MAX: Confidence = Confidence(5);

    pub fn new(value: u8) -> Result<Self, ConfidenceError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Confidence(value))
        } else {
            Err(ConfidenceError(value))
        }
    }

    /// Clamp into range. For constants in detective code.
    pub const fn saturating(value: u8) -> Self {
        if value < Self::MIN.0 {
            Self::MIN
        } else if value > Self::MAX.0 {
            Self::MAX
        } else {
            Confidence(value)
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Confidence {
    type Error = ConfidenceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Confidence::new(value)
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> u8 {
        c.0
    }
}

/// Minimum confidence needed to replace a stored, meaningful value.
pub const OVERRIDE_THRESHOLD: Confidence = Confidence::saturating(5);

/// One proposed field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub value: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Proposal {
    pub fn new(value: impl Into<String>, confidence: Confidence) -> Self {
        Proposal {
            value: value.into(),
            confidence,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// Field name → proposal. At most one proposal per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Changeset(BTreeMap<String, Proposal>);

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the proposal for `field`.
    pub fn insert(&mut self, field: impl Into<String>, proposal: Proposal) {
        self.0.insert(field.into(), proposal);
    }

    /// Shorthand used by detectives.
    pub fn propose(
        &mut self,
        field: &str,
        value: impl Into<String>,
        confidence: Confidence,
        explanation: impl Into<String>,
    ) {
        self.insert(
            field,
            Proposal::new(value, confidence).with_explanation(explanation),
        );
    }

    pub fn get(&self, field: &str) -> Option<&Proposal> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Proposal> {
        self.0.remove(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Proposal> {
        self.0.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Merge `other` into a copy of `self`; see [`merge`].
    pub fn merged_with(&self, other: &Changeset) -> Changeset {
        merge(self, other)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<(String, Proposal)> for Changeset {
    fn from_iter<I: IntoIterator<Item = (String, Proposal)>>(iter: I) -> Self {
        Changeset(iter.into_iter().collect())
    }
}

impl IntoIterator for Changeset {
    type Item = (String, Proposal);
    type IntoIter = btree_map::IntoIter<String, Proposal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Changeset {
    type Item = (&'a String, &'a Proposal);
    type IntoIter = btree_map::Iter<'a, String, Proposal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Combine two changesets.
///
/// Fields on one side only are kept as-is. For a field on both sides the
/// proposal with strictly higher confidence wins; ties keep `a`.
pub fn merge(a: &Changeset, b: &Changeset) -> Changeset {
    let mut merged = a.clone();
    for (field, proposal) in b {
        match merged.0.entry(field.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(proposal.clone());
            }
            btree_map::Entry::Occupied(mut slot) => {
                if proposal.confidence > slot.get().confidence {
                    slot.insert(proposal.clone());
                }
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: &str, confidence: u8) -> Proposal {
        Proposal::new(value, Confidence::new(confidence).unwrap())
    }

    #[test]
    fn test_confidence_range() {
        assert!(Confidence::new(0).is_err());
        assert!(Confidence::new(6).is_err());
        assert_eq!(Confidence::new(5).unwrap(), Confidence::MAX);
        assert_eq!(Confidence::saturating(9), Confidence::MAX);
        assert_eq!(Confidence::saturating(0), Confidence::MIN);
    }

    #[test]
    fn test_wire_shape() {
        let mut changeset = Changeset::new();
        changeset.propose("license", "MIT", Confidence::saturating(3), "GitHub API");
        let json = serde_json::to_value(&changeset).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "license": {"value": "MIT", "confidence": 3, "explanation": "GitHub API"}
            })
        );
    }

    #[test]
    fn test_wire_rejects_out_of_range_confidence() {
        let err = Changeset::from_json(r#"{"name": {"value": "x", "confidence": 7}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_merge_higher_confidence_wins() {
        let a: Changeset = [("contribution_status".to_string(), p("Unmet", 3))]
            .into_iter()
            .collect();
        let b: Changeset = [("contribution_status".to_string(), p("Met", 5))]
            .into_iter()
            .collect();
        let merged = merge(&a, &b);
        assert_eq!(merged.get("contribution_status"), Some(&p("Met", 5)));
    }

    #[test]
    fn test_merge_tie_keeps_left() {
        let a: Changeset = [("name".to_string(), p("widget", 3))].into_iter().collect();
        let b: Changeset = [("name".to_string(), p("Widget!", 3))].into_iter().collect();
        assert_eq!(merge(&a, &b).get("name"), Some(&p("widget", 3)));
    }

    #[test]
    fn test_merge_keeps_one_sided_fields() {
        let a: Changeset = [("name".to_string(), p("widget", 1))].into_iter().collect();
        let b: Changeset = [("license".to_string(), p("MIT", 3))].into_iter().collect();
        let merged = merge(&a, &b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged, merge(&b, &a));
    }
}
