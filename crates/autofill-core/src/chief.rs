//! The chief: runs detectives in dependency order, merges their proposals
//! and commits the trustworthy ones.
//!
//! A run moves through four states:
//!
//! 1. **Init**: a fresh [`Evidence`] cache and an empty [`Changeset`].
//! 2. **Run**: for each detective, compute `current` from the project
//!    overlaid with the accumulated changeset, analyze, validate, merge.
//! 3. **Commit**: apply the final changeset in one batch.
//! 4. **Done**: evidence and changeset are dropped; only the report remains.
//!
//! Nothing is written before Commit, so cancelling a run needs no cleanup.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use evidence_source::EvidenceSource;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use project_state::ProjectRecord;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::changeset::{merge, Changeset};
use crate::commit::{apply_changes, should_update, FieldChange};
use crate::config::ChiefConfig;
use crate::detective::{Current, Detective};
use crate::detectives::default_detectives;
use crate::error::{ChiefError, ChiefResult, DetectiveError};
use crate::evidence::Evidence;
use crate::fields::{names, FieldCatalog};
use crate::obs;
use crate::plan::DetectivePlan;
use crate::validate::validate_contribution;

/// A detective whose failure was intercepted and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectiveFailure {
    pub detective: String,
    pub reason: String,
    pub panicked: bool,
}

/// Outcome of [`Chief::autofill`].
#[derive(Debug, Clone, Serialize)]
pub struct AutofillReport {
    pub run_id: Uuid,
    /// Final merged changeset, including fields that were not committed.
    pub changeset: Changeset,
    /// Writes actually performed.
    pub applied: Vec<FieldChange>,
    pub failures: Vec<DetectiveFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Outcome of [`Chief::propose_changes`].
#[derive(Debug, Clone, Default)]
pub struct Proposals {
    pub changeset: Changeset,
    pub failures: Vec<DetectiveFailure>,
}

/// State owned by one run: its id, evidence cache and intercepted failures.
pub struct RunContext {
    run_id: Uuid,
    evidence: Evidence,
    failures: Vec<DetectiveFailure>,
}

impl RunContext {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    pub fn failures(&self) -> &[DetectiveFailure] {
        &self.failures
    }
}

enum Failure {
    Error(DetectiveError),
    Panic(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Error(err) => write!(f, "{err}"),
            Failure::Panic(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// Best known values for `fields`: the changeset value where it would be
/// committed, else the stored project value when present.
pub fn compute_current<P: ProjectRecord + ?Sized>(
    fields: &BTreeSet<String>,
    project: &P,
    changeset: &Changeset,
) -> Current {
    let mut current = Current::new();
    for field in fields {
        if should_update(project, field, changeset) {
            if let Some(proposal) = changeset.get(field) {
                current.insert(field.clone(), proposal.value.clone());
            }
        } else if project.is_present(field) {
            if let Some(value) = project.get(field) {
                current.insert(field.clone(), value);
            }
        }
    }
    current
}

pub struct Chief {
    source: Arc<dyn EvidenceSource>,
    plan: DetectivePlan,
    catalog: FieldCatalog,
    config: ChiefConfig,
}

impl Chief {
    /// Build a chief over an explicit detective registration list.
    pub fn new(
        source: Arc<dyn EvidenceSource>,
        detectives: Vec<Arc<dyn Detective>>,
        catalog: FieldCatalog,
        config: ChiefConfig,
    ) -> ChiefResult<Self> {
        Ok(Chief {
            source,
            plan: DetectivePlan::build(detectives)?,
            catalog,
            config,
        })
    }

    /// Build a chief with the standard catalog and detective set.
    pub fn with_default_detectives(
        source: Arc<dyn EvidenceSource>,
        config: ChiefConfig,
    ) -> ChiefResult<Self> {
        let catalog = FieldCatalog::standard();
        let detectives = default_detectives(&catalog)?;
        Self::new(source, detectives, catalog, config)
    }

    pub fn plan(&self) -> &DetectivePlan {
        &self.plan
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ChiefConfig {
        &self.config
    }

    /// Init: allocate the per-run state.
    pub fn start_run(&self) -> RunContext {
        RunContext {
            run_id: Uuid::new_v4(),
            evidence: Evidence::new(Arc::clone(&self.source), self.config.max_read_bytes),
            failures: Vec::new(),
        }
    }

    /// The plan for a run limited to `needed_fields` (all when `None`).
    pub fn plan_for(&self, needed_fields: Option<&BTreeSet<String>>) -> DetectivePlan {
        match needed_fields {
            None => self.plan.clone(),
            Some(_) => self
                .plan
                .restrict(&self.plan.needed_outputs(needed_fields, &BTreeSet::new())),
        }
    }

    /// Run one detective against `changeset` and return the merged result.
    ///
    /// Intercepted failures are recorded on `run` and leave `changeset`
    /// untouched; otherwise they surface as [`ChiefError::DetectiveFailed`].
    pub async fn propose_one_change<P: ProjectRecord + ?Sized>(
        &self,
        run: &mut RunContext,
        detective: &dyn Detective,
        project: &P,
        changeset: Changeset,
    ) -> ChiefResult<Changeset> {
        let current = compute_current(detective.inputs(), project, &changeset);
        let started = Instant::now();
        let outcome = self.invoke(detective, &run.evidence, &current).await;
        self.absorb(run, detective, &current, started.elapsed(), outcome, changeset)
    }

    /// Run every planned detective and return the merged changeset.
    pub async fn propose_changes<P: ProjectRecord + ?Sized>(
        &self,
        project: &P,
        needed_fields: Option<&BTreeSet<String>>,
    ) -> ChiefResult<Proposals> {
        let mut run = self.start_run();
        let plan = self.plan_for(needed_fields);
        let changeset = self.run_plan(&mut run, &plan, project).await?;
        Ok(Proposals {
            changeset,
            failures: run.failures,
        })
    }

    /// Full pass: propose, then commit into `project`.
    pub async fn autofill<P: ProjectRecord + ?Sized>(
        &self,
        project: &mut P,
        needed_fields: Option<&BTreeSet<String>>,
    ) -> ChiefResult<AutofillReport> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut run = self.start_run();
        let run_id = run.run_id.to_string();
        let label = project.get(names::REPO_URL).unwrap_or_default();
        let plan = self.plan_for(needed_fields);
        let span = obs::run_span(&run_id, &label);

        async move {
            obs::emit_run_started(&run_id, plan.len(), self.config.mode.as_str());

            let changeset = self.run_plan(&mut run, &plan, &*project).await?;
            let applied = apply_changes(project, &changeset, &self.catalog)?;
            for change in &applied {
                obs::emit_field_committed(&run_id, &change.field, change.confidence.value());
            }

            obs::emit_run_finished(
                &run_id,
                clock.elapsed().as_millis() as u64,
                changeset.len(),
                applied.len(),
                run.failures.len(),
            );

            Ok(AutofillReport {
                run_id: run.run_id,
                changeset,
                applied,
                failures: run.failures,
                started_at,
                finished_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    async fn run_plan<P: ProjectRecord + ?Sized>(
        &self,
        run: &mut RunContext,
        plan: &DetectivePlan,
        project: &P,
    ) -> ChiefResult<Changeset> {
        let mut changeset = Changeset::new();
        for level in plan.levels() {
            changeset = self.run_level(run, level, project, changeset).await?;
        }
        Ok(changeset)
    }

    /// Detectives in one level are independent; with fan-out they all see
    /// the level-start snapshot and their results merge in plan order, which
    /// gives the same changeset as running them one after another.
    async fn run_level<P: ProjectRecord + ?Sized>(
        &self,
        run: &mut RunContext,
        level: &[Arc<dyn Detective>],
        project: &P,
        changeset: Changeset,
    ) -> ChiefResult<Changeset> {
        if self.config.fanout <= 1 || level.len() < 2 {
            let mut changeset = changeset;
            for detective in level {
                changeset = self
                    .propose_one_change(run, detective.as_ref(), project, changeset)
                    .await?;
            }
            return Ok(changeset);
        }

        let snapshot = changeset;
        let evidence = &run.evidence;
        let outcomes: Vec<(Current, Duration, Result<Changeset, Failure>)> =
            stream::iter(level.iter().map(|detective| {
                let current = compute_current(detective.inputs(), project, &snapshot);
                async move {
                    let started = Instant::now();
                    let outcome = self.invoke(detective.as_ref(), evidence, &current).await;
                    (current, started.elapsed(), outcome)
                }
            }))
            .buffered(self.config.fanout)
            .collect()
            .await;

        let mut changeset = snapshot;
        for (detective, (current, elapsed, outcome)) in level.iter().zip(outcomes) {
            changeset = self.absorb(run, detective.as_ref(), &current, elapsed, outcome, changeset)?;
        }
        Ok(changeset)
    }

    async fn invoke(
        &self,
        detective: &dyn Detective,
        evidence: &Evidence,
        current: &Current,
    ) -> Result<Changeset, Failure> {
        let analysis = detective.analyze(evidence, current);
        if !self.config.mode.intercepts_failures() {
            return analysis.await.map_err(Failure::Error);
        }
        match AssertUnwindSafe(analysis).catch_unwind().await {
            Ok(result) => result.map_err(Failure::Error),
            Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref()))),
        }
    }

    fn absorb(
        &self,
        run: &mut RunContext,
        detective: &dyn Detective,
        current: &Current,
        elapsed: Duration,
        outcome: Result<Changeset, Failure>,
        changeset: Changeset,
    ) -> ChiefResult<Changeset> {
        let run_id = run.run_id.to_string();
        match outcome {
            Ok(contribution) => {
                let (accepted, rejections) =
                    validate_contribution(detective.descriptor(), contribution);
                for rejection in &rejections {
                    obs::emit_proposal_rejected(
                        &run_id,
                        detective.name(),
                        &rejection.field,
                        &rejection.reason,
                    );
                }
                obs::emit_detective_finished(
                    &run_id,
                    detective.name(),
                    accepted.len(),
                    elapsed.as_millis() as u64,
                );
                Ok(merge(&changeset, &accepted))
            }
            Err(failure) => {
                let intercepted = self.config.mode.intercepts_failures();
                obs::emit_detective_failed(
                    &run_id,
                    detective.name(),
                    &failure,
                    &changeset,
                    current,
                    intercepted,
                );
                match failure {
                    Failure::Error(source) if !intercepted => Err(ChiefError::DetectiveFailed {
                        detective: detective.name().to_string(),
                        source,
                    }),
                    failure => {
                        run.failures.push(DetectiveFailure {
                            detective: detective.name().to_string(),
                            reason: failure.to_string(),
                            panicked: matches!(failure, Failure::Panic(_)),
                        });
                        Ok(changeset)
                    }
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
