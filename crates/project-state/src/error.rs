//! Error types for project-state

use thiserror::Error;

/// Errors that can occur while reading or updating a project record
#[derive(Error, Debug)]
pub enum StateError {
    /// Field name is empty or otherwise unusable as a key
    #[error("Invalid field name: {field:?}")]
    InvalidField { field: String },

    /// Field exists but the record owner does not allow writes to it
    #[error("Field is read-only: {field}")]
    ReadOnlyField { field: String },

    /// Record document is not a JSON object
    #[error("Project record must be a JSON object, got {kind}")]
    NotAnObject { kind: String },

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
