//! Detective dependency planning.
//!
//! Detectives are nodes; an edge `P → C` exists when `P` outputs a field
//! that `C` reads. Kahn's algorithm assigns every detective a level (the
//! length of its longest input chain), so detectives sharing a level never
//! depend on each other and may run side by side. Registration order breaks
//! ties inside a level, which keeps the plan deterministic.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::detective::Detective;
use crate::error::{ChiefError, ChiefResult};

/// One row of a rendered plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// 0-indexed position in execution order.
    pub position: usize,
    /// Topological level; steps sharing a level are independent.
    pub level: usize,
    pub detective: &'static str,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// Detectives whose outputs this step reads.
    pub depends_on: Vec<&'static str>,
}

/// Validated execution order over a set of detectives.
#[derive(Clone)]
pub struct DetectivePlan {
    detectives: Vec<Arc<dyn Detective>>,
    levels: Vec<usize>,
    /// Upstream detectives, as positions in `detectives`.
    upstream: Vec<BTreeSet<usize>>,
}

impl DetectivePlan {
    /// Order `detectives` so every producer runs before its consumers.
    ///
    /// Returns [`ChiefError::DependencyCycle`] naming the detectives left
    /// unscheduled, or [`ChiefError::DuplicateDetective`] on a name clash.
    pub fn build(detectives: Vec<Arc<dyn Detective>>) -> ChiefResult<Self> {
        let mut seen = HashSet::new();
        for detective in &detectives {
            if !seen.insert(detective.name()) {
                return Err(ChiefError::DuplicateDetective {
                    name: detective.name().to_string(),
                });
            }
        }

        let mut producers: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, detective) in detectives.iter().enumerate() {
            for field in detective.outputs() {
                producers.entry(field.as_str()).or_default().push(idx);
            }
        }

        // upstream[c] = producers of c's inputs; self-edges ignored.
        let upstream: Vec<BTreeSet<usize>> = detectives
            .iter()
            .enumerate()
            .map(|(consumer, detective)| {
                detective
                    .inputs()
                    .iter()
                    .filter_map(|field| producers.get(field.as_str()))
                    .flatten()
                    .copied()
                    .filter(|&producer| producer != consumer)
                    .collect()
            })
            .collect();

        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); detectives.len()];
        for (consumer, deps) in upstream.iter().enumerate() {
            for &producer in deps {
                downstream[producer].push(consumer);
            }
        }

        let mut in_degree: Vec<usize> = upstream.iter().map(BTreeSet::len).collect();
        let mut frontier: Vec<usize> = (0..detectives.len())
            .filter(|&idx| in_degree[idx] == 0)
            .collect();
        let mut order: Vec<(usize, usize)> = Vec::with_capacity(detectives.len());
        let mut level = 0;

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for &idx in &frontier {
                order.push((idx, level));
                for &dependent in &downstream[idx] {
                    in_degree[dependent] -= 1;
                    if in_degree[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }
            // Registration order inside a level.
            next.sort_unstable();
            frontier = next;
            level += 1;
        }

        if order.len() != detectives.len() {
            let scheduled: HashSet<usize> = order.iter().map(|&(idx, _)| idx).collect();
            return Err(ChiefError::DependencyCycle {
                detectives: detectives
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| !scheduled.contains(idx))
                    .map(|(_, d)| d.name().to_string())
                    .collect(),
            });
        }

        let mut position_of = vec![0; detectives.len()];
        for (position, &(idx, _)) in order.iter().enumerate() {
            position_of[idx] = position;
        }

        Ok(DetectivePlan {
            detectives: order
                .iter()
                .map(|&(idx, _)| Arc::clone(&detectives[idx]))
                .collect(),
            levels: order.iter().map(|&(_, level)| level).collect(),
            upstream: order
                .iter()
                .map(|&(idx, _)| upstream[idx].iter().map(|&u| position_of[u]).collect())
                .collect(),
        })
    }

    /// Keep only detectives that produce a needed field, plus the transitive
    /// producers of their inputs. An empty set keeps everything.
    pub fn restrict(&self, needed_fields: &BTreeSet<String>) -> DetectivePlan {
        if needed_fields.is_empty() {
            return self.clone();
        }

        let mut keep: BTreeSet<usize> = self
            .detectives
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.outputs().is_disjoint(needed_fields))
            .map(|(pos, _)| pos)
            .collect();

        let mut queue: Vec<usize> = keep.iter().copied().collect();
        while let Some(pos) = queue.pop() {
            for &up in &self.upstream[pos] {
                if keep.insert(up) {
                    queue.push(up);
                }
            }
        }

        let new_position: BTreeMap<usize, usize> = keep
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new))
            .collect();

        DetectivePlan {
            detectives: keep
                .iter()
                .map(|&pos| Arc::clone(&self.detectives[pos]))
                .collect(),
            levels: keep.iter().map(|&pos| self.levels[pos]).collect(),
            upstream: keep
                .iter()
                .map(|&pos| {
                    self.upstream[pos]
                        .iter()
                        .filter_map(|up| new_position.get(up).copied())
                        .collect()
                })
                .collect(),
        }
    }

    /// Fields worth computing: every output when nothing specific is
    /// requested, otherwise the requested fields some detective produces.
    /// Explicitly changed fields are always included.
    pub fn needed_outputs(
        &self,
        needed_fields: Option<&BTreeSet<String>>,
        changed_fields: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        let all_outputs = self
            .detectives
            .iter()
            .flat_map(|d| d.outputs().iter().cloned());

        let mut needed: BTreeSet<String> = match needed_fields {
            None => all_outputs.collect(),
            Some(requested) => all_outputs.filter(|f| requested.contains(f)).collect(),
        };
        needed.extend(changed_fields.iter().cloned());
        needed
    }

    /// Detectives in execution order.
    pub fn detectives(&self) -> &[Arc<dyn Detective>] {
        &self.detectives
    }

    /// Execution order grouped into independent levels.
    pub fn levels(&self) -> Vec<&[Arc<dyn Detective>]> {
        let mut groups = Vec::new();
        let mut start = 0;
        for end in 1..=self.detectives.len() {
            if end == self.detectives.len() || self.levels[end] != self.levels[start] {
                groups.push(&self.detectives[start..end]);
                start = end;
            }
        }
        groups
    }

    pub fn steps(&self) -> Vec<PlanStep> {
        self.detectives
            .iter()
            .enumerate()
            .map(|(position, detective)| PlanStep {
                position,
                level: self.levels[position],
                detective: detective.name(),
                inputs: detective.inputs().iter().cloned().collect(),
                outputs: detective.outputs().iter().cloned().collect(),
                depends_on: self.upstream[position]
                    .iter()
                    .map(|&up| self.detectives[up].name())
                    .collect(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.detectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectives.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.detectives.iter().position(|d| d.name() == name)
    }
}

impl fmt::Debug for DetectivePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.detectives.iter().map(|d| d.name()))
            .finish()
    }
}
