//! In-memory project record
//!
//! `MemoryProject` satisfies the [`ProjectRecord`] contract without any
//! external storage. Tests use it directly; the CLI uses it as the in-memory
//! form of a project JSON document.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StateError;
use crate::record::{FieldUpdate, ProjectRecord};
use crate::StateResult;

/// In-memory project record backed by a `BTreeMap<field, value>`.
///
/// A project parsed with [`MemoryProject::from_json`] keeps its source
/// document; rendering overlays only the fields written since.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryProject {
    fields: BTreeMap<String, String>,
    document: Map<String, Value>,
    written: BTreeSet<String>,
    read_only: BTreeSet<String>,
    writes: usize,
}

impl MemoryProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field initialisation.
    pub fn with_field(mut self, field: &str, value: &str) -> Self {
        self.fields.insert(field.to_string(), value.to_string());
        self
    }

    /// Refuse writes to `field` (e.g. identity attributes owned elsewhere).
    pub fn with_read_only(mut self, field: &str) -> Self {
        self.read_only.insert(field.to_string());
        self
    }

    /// Number of successful field writes since construction.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// All stored fields, ordered by name.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Parse a project from a JSON object.
    ///
    /// Strings are kept as-is, numbers and booleans are readable in their
    /// JSON text form, `null` means "never set" and nested values are not
    /// readable. All of them survive [`MemoryProject::to_json_pretty`]
    /// unless written.
    pub fn from_json(text: &str) -> StateResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(StateError::NotAnObject {
                    kind: json_kind(&other).to_string(),
                })
            }
        };

        let mut project = Self::new();
        for (field, value) in &map {
            match value {
                Value::String(s) => {
                    project.fields.insert(field.clone(), s.clone());
                }
                Value::Number(n) => {
                    project.fields.insert(field.clone(), n.to_string());
                }
                Value::Bool(b) => {
                    project.fields.insert(field.clone(), b.to_string());
                }
                Value::Null => {}
                Value::Array(_) | Value::Object(_) => {
                    debug!(field = %field, "Structured project field is not readable");
                }
            }
        }
        project.document = map;
        Ok(project)
    }

    /// Render the project as a pretty-printed JSON object.
    ///
    /// Fields from the source document keep their JSON type;
    /// written or builder-added fields are rendered as strings.
    pub fn to_json_pretty(&self) -> StateResult<String> {
        let mut map = self.document.clone();
        for (field, value) in &self.fields {
            if self.written.contains(field) || !map.contains_key(field) {
                map.insert(field.clone(), Value::String(value.clone()));
            }
        }
        Ok(serde_json::to_string_pretty(&Value::Object(map))?)
    }

    fn check_writable(&self, field: &str) -> StateResult<()> {
        if field.trim().is_empty() {
            return Err(StateError::InvalidField {
                field: field.to_string(),
            });
        }
        if self.read_only.contains(field) {
            return Err(StateError::ReadOnlyField {
                field: field.to_string(),
            });
        }
        Ok(())
    }
}

impl ProjectRecord for MemoryProject {
    fn get(&self, field: &str) -> Option<String> {
        self.fields.get(field).cloned()
    }

    fn set(&mut self, field: &str, value: String) -> StateResult<()> {
        self.check_writable(field)?;
        self.fields.insert(field.to_string(), value);
        self.written.insert(field.to_string());
        self.writes += 1;
        Ok(())
    }

    /// All-or-nothing: every update is validated before any is written.
    fn apply(&mut self, updates: &[FieldUpdate]) -> StateResult<()> {
        for update in updates {
            self.check_writable(&update.field)?;
        }
        for update in updates {
            self.fields
                .insert(update.field.clone(), update.value.clone());
            self.written.insert(update.field.clone());
            self.writes += 1;
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_flattens_scalars() {
        let project = MemoryProject::from_json(
            r#"{"name":"widget","id":42,"disabled":false,"license":null,"tags":["a"]}"#,
        )
        .unwrap();
        assert_eq!(project.get("name").as_deref(), Some("widget"));
        assert_eq!(project.get("id").as_deref(), Some("42"));
        assert_eq!(project.get("disabled").as_deref(), Some("false"));
        assert_eq!(project.get("license"), None);
        assert_eq!(project.get("tags"), None);
    }

    #[test]
    fn test_render_keeps_unwritten_json_types() {
        let mut project = MemoryProject::from_json(
            r#"{"id":42,"tags":["a","b"],"meta":{"k":1},"name":"w","license":null}"#,
        )
        .unwrap();
        project.set("license", "MIT".to_string()).unwrap();

        let value: Value = serde_json::from_str(&project.to_json_pretty().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 42,
                "tags": ["a", "b"],
                "meta": {"k": 1},
                "name": "w",
                "license": "MIT"
            })
        );
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = MemoryProject::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, StateError::NotAnObject { .. }));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut project = MemoryProject::new()
            .with_field("repo_url", "https://github.com/acme/widget")
            .with_read_only("repo_url");

        let err = project
            .apply(&[
                FieldUpdate::new("license", "MIT"),
                FieldUpdate::new("repo_url", "https://example.com"),
            ])
            .unwrap_err();

        assert!(matches!(err, StateError::ReadOnlyField { .. }));
        assert_eq!(project.get("license"), None);
        assert_eq!(project.write_count(), 0);
    }

    #[test]
    fn test_set_rejects_empty_field_name() {
        let mut project = MemoryProject::new();
        let err = project.set(" ", "x".to_string()).unwrap_err();
        assert!(matches!(err, StateError::InvalidField { .. }));
    }
}
