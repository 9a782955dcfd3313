// src/engine/core.rs

//! Pure per-run state machine.
//!
//! [`CoreRun`] walks an [`ExecutionPlan`] and, for each target in turn,
//! decides whether the IO shell should execute its action or skip it. It has
//! no Tokio types and performs no IO, so the cascading-skip rules are unit
//! tested here without actions or processes.

use tracing::{debug, warn};

use crate::dag::{ExecutionPlan, StateTable, TargetGraph};
use crate::errors::{Result, RundagError};
use crate::types::{TargetName, TargetState};

/// Decision returned by [`CoreRun::next_step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreStep {
    /// Run this target's action, then report back with [`CoreRun::complete`].
    Execute(TargetName),
    /// The target was marked `Skipped` because `blocked_by` did not succeed.
    Skip {
        target: TargetName,
        blocked_by: TargetName,
    },
    /// A target is still running; it must complete before anything else.
    Busy(TargetName),
    /// Every planned target is terminal.
    Finished,
}

#[derive(Debug)]
pub struct CoreRun<'g> {
    graph: &'g TargetGraph,
    states: StateTable,
    running: Option<TargetName>,
}

impl<'g> CoreRun<'g> {
    /// Start a run of `plan` against `graph`.
    ///
    /// The plan must have been resolved from a graph with the same shape:
    /// every target registered, every dependency planned earlier.
    pub fn new(graph: &'g TargetGraph, plan: &ExecutionPlan) -> Result<Self> {
        for (pos, name) in plan.iter().enumerate() {
            if !graph.contains(name) {
                return Err(RundagError::UnknownTarget(name.to_string()));
            }
            for dep in graph.dependencies_of(name) {
                match plan.position(dep) {
                    Some(dep_pos) if dep_pos < pos => {}
                    Some(_) => {
                        return Err(RundagError::InvalidPlan(format!(
                            "target '{name}' is planned before its dependency '{dep}'"
                        )));
                    }
                    None => {
                        return Err(RundagError::InvalidPlan(format!(
                            "dependency '{dep}' of target '{name}' is not in the plan"
                        )));
                    }
                }
            }
        }

        Ok(Self {
            graph,
            states: StateTable::for_plan(plan),
            running: None,
        })
    }

    /// Advance to the next pending target in plan order.
    pub fn next_step(&mut self) -> CoreStep {
        if let Some(name) = &self.running {
            return CoreStep::Busy(name.clone());
        }

        let Some(name) = self.states.next_pending().map(str::to_string) else {
            return CoreStep::Finished;
        };

        let graph = self.graph;
        if let Some(blocker) = self.states.blocking_dependency(graph.dependencies_of(&name)) {
            let blocked_by = blocker.to_string();
            self.states.transition(&name, TargetState::Skipped);
            debug!(target_name = %name, blocked_by = %blocked_by, "dependency did not succeed; skipping");
            return CoreStep::Skip {
                target: name,
                blocked_by,
            };
        }

        self.states.transition(&name, TargetState::Running);
        self.running = Some(name.clone());
        CoreStep::Execute(name)
    }

    /// Record the result of the running target's action. Returns the state
    /// the target ended in, or `None` if `name` is not the running target.
    pub fn complete(&mut self, name: &str, succeeded: bool) -> Option<TargetState> {
        if self.running.as_deref() != Some(name) {
            warn!(
                target_name = %name,
                running = ?self.running,
                "completion for a target that is not running; ignoring"
            );
            return None;
        }

        let next = if succeeded {
            TargetState::Succeeded
        } else {
            TargetState::Failed
        };
        self.states.transition(name, next);
        self.running = None;
        Some(next)
    }

    pub fn is_finished(&self) -> bool {
        self.states.all_terminal()
    }

    pub fn states(&self) -> &StateTable {
        &self.states
    }
}
