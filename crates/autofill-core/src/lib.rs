//! Autofill Core: infers best-practices badge answers from a project's
//! public artifacts.
//!
//! ## Layer 2 - Inference
//!
//! Detectives read evidence and propose field values with a confidence;
//! the [`Chief`] runs them in dependency order, merges their proposals and
//! commits only what the override policy allows.
//!
//! ## Key Components
//!
//! - [`CriterionStatus`]: the four-valued status codec
//! - [`Changeset`] and [`merge`]: proposals keyed by field, higher confidence wins
//! - [`Evidence`]: per-run fetch cache, one fetch per key
//! - [`Detective`]: the heuristic contract, with the standard set in [`detectives`]
//! - [`DetectivePlan`]: dependency ordering of detectives
//! - [`Chief`]: orchestration, failure policy and commit

pub mod changeset;
pub mod chief;
pub mod commit;
pub mod config;
pub mod detective;
pub mod detectives;
pub mod error;
pub mod evidence;
pub mod fields;
pub mod obs;
pub mod plan;
pub mod status;
pub mod telemetry;
pub mod validate;

pub use changeset::{merge, Changeset, Confidence, ConfidenceError, Proposal, OVERRIDE_THRESHOLD};
pub use chief::{compute_current, AutofillReport, Chief, DetectiveFailure, Proposals, RunContext};
pub use commit::{append_justification, apply_changes, plan_commit, should_update, FieldChange};
pub use config::{ChiefConfig, RunMode};
pub use detective::{Current, Detective, DetectiveDescriptor};
pub use detectives::default_detectives;
pub use error::{ChiefError, ChiefResult, DetectiveError, DetectiveResult};
pub use evidence::Evidence;
pub use fields::{FieldCatalog, MAX_TEXT_LENGTH};
pub use plan::{DetectivePlan, PlanStep};
pub use status::{CriterionStatus, StatusError};
pub use validate::{validate_contribution, RejectReason, Rejection};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
