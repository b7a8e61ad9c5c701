//! Error types for the autofill engine.

use project_state::StateError;
use thiserror::Error;

/// Failures a detective reports instead of a changeset.
///
/// Undecided is not a failure: a detective with nothing to say returns an
/// empty changeset.
#[derive(Debug, Error)]
pub enum DetectiveError {
    /// Evidence was fetched but could not be understood
    #[error("malformed evidence {key}: {reason}")]
    MalformedEvidence { key: String, reason: String },

    /// A declared input holds a value the detective cannot work with
    #[error("invalid input {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("{0}")]
    Other(String),
}

pub type DetectiveResult<T> = std::result::Result<T, DetectiveError>;

/// Errors produced by planning and running the chief.
#[derive(Debug, Error)]
pub enum ChiefError {
    /// Declared inputs/outputs form a cycle.
    #[error("dependency cycle detected involving detectives: {detectives:?}")]
    DependencyCycle { detectives: Vec<String> },

    /// Two registered detectives share a name.
    #[error("detective registered twice: {name}")]
    DuplicateDetective { name: String },

    /// A detective pattern failed to compile.
    #[error("invalid detective pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A detective failed and the run mode does not intercept failures.
    #[error("detective {detective} failed: {source}")]
    DetectiveFailed {
        detective: String,
        #[source]
        source: DetectiveError,
    },

    /// The project refused the commit.
    #[error("commit failed: {0}")]
    Commit(#[from] StateError),
}

pub type ChiefResult<T> = std::result::Result<T, ChiefError>;
