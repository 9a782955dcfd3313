// src/dag/state.rs

//! Per-run completion state for the targets of one plan.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::dag::plan::ExecutionPlan;
use crate::types::{TargetName, TargetState};

/// Completion state of every planned target, in plan order.
///
/// All targets start `Pending`. Transitions are checked against
/// [`TargetState::can_transition_to`]; an illegal transition is refused and
/// logged, and the previous state is kept.
#[derive(Debug, Clone)]
pub struct StateTable {
    states: IndexMap<TargetName, TargetState>,
}

impl StateTable {
    pub fn for_plan(plan: &ExecutionPlan) -> Self {
        let states = plan
            .iter()
            .map(|name| (name.to_string(), TargetState::Pending))
            .collect();
        Self { states }
    }

    pub fn state_of(&self, name: &str) -> Option<TargetState> {
        self.states.get(name).copied()
    }

    /// Move `name` to `next`. Returns `false` (and leaves the state untouched)
    /// when the target is unknown or the transition is illegal.
    pub fn transition(&mut self, name: &str, next: TargetState) -> bool {
        let Some(current) = self.states.get_mut(name) else {
            warn!(target_name = %name, "state transition for target outside the plan; ignoring");
            return false;
        };

        if !current.can_transition_to(next) {
            warn!(
                target_name = %name,
                from = %current,
                to = %next,
                "illegal target state transition; ignoring"
            );
            return false;
        }

        debug!(target_name = %name, from = %current, to = %next, "target state changed");
        *current = next;
        true
    }

    /// First dependency in `deps` that prevents a target from running:
    /// anything not `Succeeded`.
    ///
    /// Dependencies are always earlier in the plan, so by the time a target
    /// is considered each of them is terminal.
    pub fn blocking_dependency<'d>(&self, deps: &'d [TargetName]) -> Option<&'d str> {
        deps.iter()
            .find(|dep| self.state_of(dep) != Some(TargetState::Succeeded))
            .map(String::as_str)
    }

    /// Next target, in plan order, that is still `Pending`.
    pub fn next_pending(&self) -> Option<&str> {
        self.states
            .iter()
            .find(|(_, state)| **state == TargetState::Pending)
            .map(|(name, _)| name.as_str())
    }

    pub fn all_terminal(&self) -> bool {
        self.states.values().all(|s| s.is_terminal())
    }

    /// Names currently in `state`, in plan order.
    pub fn names_in(&self, state: TargetState) -> Vec<TargetName> {
        self.states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TargetState)> {
        self.states.iter().map(|(name, state)| (name.as_str(), *state))
    }
}
