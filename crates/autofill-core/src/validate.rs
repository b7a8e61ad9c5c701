//! Proposal validation applied to each detective contribution before merge.

use std::fmt;

use crate::changeset::{Changeset, Proposal};
use crate::detective::DetectiveDescriptor;
use crate::fields::{is_justification_field, is_status_field, truncate_text, MAX_TEXT_LENGTH};
use crate::status::{CriterionStatus, StatusError};

/// Why a proposal was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Field is not among the detective's declared outputs.
    UndeclaredOutput,
    /// Status value is unknown, empty, or not a status at all.
    InvalidStatus(StatusError),
    /// Justification text is blank.
    EmptyJustification,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UndeclaredOutput => f.write_str("field not in declared outputs"),
            RejectReason::InvalidStatus(err) => write!(f, "{err}"),
            RejectReason::EmptyJustification => f.write_str("justification is blank"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub field: String,
    pub reason: RejectReason,
}

/// Keep only the proposals a detective is entitled to make, normalised.
///
/// Status values are canonicalised, justification and explanation text is
/// trimmed to [`MAX_TEXT_LENGTH`], and confidence is capped per the
/// descriptor's overridable outputs.
pub fn validate_contribution(
    descriptor: &DetectiveDescriptor,
    contribution: Changeset,
) -> (Changeset, Vec<Rejection>) {
    let mut accepted = Changeset::new();
    let mut rejections = Vec::new();

    for (field, proposal) in contribution {
        match check(descriptor, &field, proposal) {
            Ok(proposal) => accepted.insert(field, proposal),
            Err(reason) => rejections.push(Rejection { field, reason }),
        }
    }
    (accepted, rejections)
}

fn check(
    descriptor: &DetectiveDescriptor,
    field: &str,
    mut proposal: Proposal,
) -> Result<Proposal, RejectReason> {
    if !descriptor.outputs().contains(field) {
        return Err(RejectReason::UndeclaredOutput);
    }

    if is_status_field(field) {
        let status = CriterionStatus::parse_for_automation(&proposal.value)
            .map_err(RejectReason::InvalidStatus)?;
        proposal.value = status.as_str().to_string();
    } else if is_justification_field(field) {
        let text = proposal.value.trim();
        if text.is_empty() {
            return Err(RejectReason::EmptyJustification);
        }
        proposal.value = truncate_text(text, MAX_TEXT_LENGTH).to_string();
    }

    proposal.explanation = proposal
        .explanation
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|e| truncate_text(e, MAX_TEXT_LENGTH).to_string());

    proposal.confidence = proposal.confidence.min(descriptor.confidence_cap(field));
    Ok(proposal)
}
