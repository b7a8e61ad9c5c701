//! Project record contract
//!
//! A project record is a mutable key/value entity: criterion status fields,
//! their justifications, and identifying attributes such as `repo_url`,
//! `homepage_url`, `license` and `name`. Values are exchanged as text; the
//! record owner decides how they are stored.

use serde::{Deserialize, Serialize};

use crate::StateResult;

/// A single staged write into a project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// Field name, e.g. `"contribution_status"`.
    pub field: String,
    /// New value for the field.
    pub value: String,
}

impl FieldUpdate {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Read/write access to one project record.
///
/// Guarantees expected by the autofill engine:
/// - `get` returns the stored value, or `None` when the field was never set.
/// - `is_present` is true only for a set, non-blank value.
/// - `apply` writes a whole batch or nothing; implementations backed by a
///   database wrap it in their own transaction.
pub trait ProjectRecord: Send {
    /// Read a field by name.
    fn get(&self, field: &str) -> Option<String>;

    /// Write a field by name.
    fn set(&mut self, field: &str, value: String) -> StateResult<()>;

    /// Is this field set and non-blank?
    fn is_present(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }

    /// Apply a batch of updates.
    ///
    /// The default writes updates in order and stops at the first error;
    /// owners with real transactions should override it.
    fn apply(&mut self, updates: &[FieldUpdate]) -> StateResult<()> {
        for update in updates {
            self.set(&update.field, update.value.clone())?;
        }
        Ok(())
    }
}

impl<T: ProjectRecord + ?Sized> ProjectRecord for Box<T> {
    fn get(&self, field: &str) -> Option<String> {
        (**self).get(field)
    }

    fn set(&mut self, field: &str, value: String) -> StateResult<()> {
        (**self).set(field, value)
    }

    fn is_present(&self, field: &str) -> bool {
        (**self).is_present(field)
    }

    fn apply(&mut self, updates: &[FieldUpdate]) -> StateResult<()> {
        (**self).apply(updates)
    }
}
