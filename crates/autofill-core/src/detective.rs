//! Detective contract.
//!
//! A detective is a stateless heuristic. It declares the fields it reads
//! (`inputs`) and the fields it may propose (`outputs`), and turns evidence
//! plus the current best values of its inputs into a partial changeset.
//!
//! Rules every implementation follows:
//! - read only declared inputs; propose only declared outputs
//! - return an empty changeset when undecided, an error only when broken
//! - fetch derived data through [`Evidence`], never directly

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::changeset::{Changeset, Confidence, OVERRIDE_THRESHOLD};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;

/// Current best values for a detective's declared inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Current(BTreeMap<String, String>);

impl Current {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// The value, trimmed, when set and non-blank.
    pub fn present(&self, field: &str) -> Option<&str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Current {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Current(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Static metadata of a detective, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectiveDescriptor {
    name: &'static str,
    inputs: BTreeSet<String>,
    outputs: BTreeSet<String>,
    overridable_outputs: Option<BTreeSet<String>>,
}

impl DetectiveDescriptor {
    pub fn new(name: &'static str) -> Self {
        DetectiveDescriptor {
            name,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            overridable_outputs: None,
        }
    }

    pub fn with_inputs<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_outputs<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Declare which outputs may force an override. Once declared, every
    /// other output is capped below [`OVERRIDE_THRESHOLD`]; an empty list
    /// makes the detective suggest-only.
    pub fn with_overridable_outputs<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overridable_outputs = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inputs(&self) -> &BTreeSet<String> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeSet<String> {
        &self.outputs
    }

    pub fn overridable_outputs(&self) -> Option<&BTreeSet<String>> {
        self.overridable_outputs.as_ref()
    }

    /// Highest confidence this detective may assert for `field`.
    pub fn confidence_cap(&self, field: &str) -> Confidence {
        match &self.overridable_outputs {
            Some(allowed) if !allowed.contains(field) => {
                Confidence::saturating(OVERRIDE_THRESHOLD.value() - 1)
            }
            _ => Confidence::MAX,
        }
    }
}

#[async_trait]
pub trait Detective: Send + Sync {
    fn descriptor(&self) -> &DetectiveDescriptor;

    fn name(&self) -> &'static str {
        self.descriptor().name()
    }

    fn inputs(&self) -> &BTreeSet<String> {
        self.descriptor().inputs()
    }

    fn outputs(&self) -> &BTreeSet<String> {
        self.descriptor().outputs()
    }

    fn overridable_outputs(&self) -> Option<&BTreeSet<String>> {
        self.descriptor().overridable_outputs()
    }

    /// Propose values for some of the declared outputs.
    async fn analyze(&self, evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_present_ignores_blank() {
        let current: Current = [("license", "  "), ("repo_url", " https://x.example ")]
            .into_iter()
            .collect();
        assert_eq!(current.present("license"), None);
        assert_eq!(current.present("repo_url"), Some("https://x.example"));
        assert_eq!(current.get("license"), Some("  "));
        assert_eq!(current.present("missing"), None);
    }

    #[test]
    fn test_cap_without_declaration_is_max() {
        let descriptor = DetectiveDescriptor::new("Plain").with_outputs(["a_status"]);
        assert_eq!(descriptor.confidence_cap("a_status"), Confidence::MAX);
    }

    #[test]
    fn test_cap_with_declaration_limits_other_outputs() {
        let descriptor = DetectiveDescriptor::new("Partial")
            .with_outputs(["a_status", "b_status"])
            .with_overridable_outputs(["a_status"]);
        assert_eq!(descriptor.confidence_cap("a_status"), Confidence::MAX);
        assert_eq!(descriptor.confidence_cap("b_status").value(), 4);
    }

    #[test]
    fn test_empty_declaration_is_suggest_only() {
        let descriptor = DetectiveDescriptor::new("Suggest")
            .with_outputs(["a_status"])
            .with_overridable_outputs(Vec::<String>::new());
        assert!(descriptor.confidence_cap("a_status") < OVERRIDE_THRESHOLD);
    }
}
