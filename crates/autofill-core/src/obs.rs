//! Structured observability hooks for the autofill run lifecycle.
//!
//! - `run_span` tagging everything inside a run with its `run_id`
//! - `emit_*` helpers, one per lifecycle event, with a stable `event` field
//!
//! Filter with `RUST_LOG`; pass `--json-logs` to the CLI for JSON lines.

use tracing::{debug, error, info, warn};

use crate::changeset::Changeset;
use crate::detective::Current;

/// Span tagging everything inside one run with its `run_id`.
///
/// Attach with `tracing::Instrument::instrument`; an entered guard must not
/// be held across `.await`.
pub fn run_span(run_id: &str, project: &str) -> tracing::Span {
    tracing::info_span!("autofill.run", run_id = %run_id, project = %project)
}

pub fn emit_run_started(run_id: &str, detectives: usize, mode: &str) {
    info!(event = "run.started", run_id = %run_id, detectives = detectives, mode = %mode);
}

pub fn emit_detective_finished(run_id: &str, detective: &str, proposals: usize, duration_ms: u64) {
    debug!(
        event = "detective.finished",
        run_id = %run_id,
        detective = %detective,
        proposals = proposals,
        duration_ms = duration_ms,
    );
}

/// A detective failed; logs the state at failure so the run can be replayed.
pub fn emit_detective_failed(
    run_id: &str,
    detective: &str,
    reason: &dyn std::fmt::Display,
    changeset: &Changeset,
    current: &Current,
    intercepted: bool,
) {
    let changeset = serde_json::to_string(changeset).unwrap_or_default();
    let current: Vec<(&str, &str)> = current.iter().collect();
    if intercepted {
        warn!(
            event = "detective.failed",
            run_id = %run_id,
            detective = %detective,
            error = %reason,
            changeset = %changeset,
            current = ?current,
        );
    } else {
        error!(
            event = "detective.failed",
            run_id = %run_id,
            detective = %detective,
            error = %reason,
            changeset = %changeset,
            current = ?current,
        );
    }
}

pub fn emit_proposal_rejected(run_id: &str, detective: &str, field: &str, reason: &dyn std::fmt::Display) {
    warn!(
        event = "proposal.rejected",
        run_id = %run_id,
        detective = %detective,
        field = %field,
        reason = %reason,
    );
}

pub fn emit_field_committed(run_id: &str, field: &str, confidence: u8) {
    info!(event = "field.committed", run_id = %run_id, field = %field, confidence = confidence);
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, proposals: usize, applied: usize, failures: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        proposals = proposals,
        applied = applied,
        failures = failures,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let span = run_span("test-run-id", "https://github.com/acme/widget");
        let _guard = span.enter();
    }

    #[test]
    fn test_emit_failed_without_subscriber() {
        emit_detective_failed(
            "r",
            "Build",
            &"boom",
            &Changeset::new(),
            &Current::new(),
            true,
        );
    }
}
