// src/engine/hooks.rs

//! Outcome hooks: callbacks attached to one target that run once the target
//! reaches a terminal state (e.g. publishing test results to a CI service).
//!
//! Hook errors are reported to the caller but never change the target's
//! state or the overall result of the run.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde::Deserialize;

use crate::engine::TargetOutcome;
use crate::exec::{Action, ShellAction};
use crate::types::TargetState;

pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

pub trait OutcomeHook: Send {
    fn on_outcome<'a>(&'a mut self, outcome: &'a TargetOutcome) -> HookFuture<'a>;
}

/// Which final states fire a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookTrigger {
    Success,
    Failure,
    /// Any terminal state, including `Skipped`.
    Always,
}

impl HookTrigger {
    pub fn fires_on(self, state: TargetState) -> bool {
        match self {
            HookTrigger::Success => state == TargetState::Succeeded,
            HookTrigger::Failure => state == TargetState::Failed,
            HookTrigger::Always => state.is_terminal(),
        }
    }
}

/// Adapts a synchronous closure into an [`OutcomeHook`]. Fires on every
/// outcome; the closure decides what to do with it.
pub struct FnHook<F> {
    f: F,
}

impl<F> FnHook<F>
where
    F: FnMut(&TargetOutcome) -> Result<()> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHook").finish_non_exhaustive()
    }
}

impl<F> OutcomeHook for FnHook<F>
where
    F: FnMut(&TargetOutcome) -> Result<()> + Send,
{
    fn on_outcome<'a>(&'a mut self, outcome: &'a TargetOutcome) -> HookFuture<'a> {
        let result = (self.f)(outcome);
        Box::pin(async move { result })
    }
}

/// Runs a shell command when the trigger matches.
///
/// The command sees `RUNDAG_TARGET` and `RUNDAG_STATE` in its environment.
#[derive(Debug, Clone)]
pub struct ShellHook {
    trigger: HookTrigger,
    action: ShellAction,
}

impl ShellHook {
    pub fn new(trigger: HookTrigger, action: ShellAction) -> Self {
        Self { trigger, action }
    }
}

impl OutcomeHook for ShellHook {
    fn on_outcome<'a>(&'a mut self, outcome: &'a TargetOutcome) -> HookFuture<'a> {
        Box::pin(async move {
            if !self.trigger.fires_on(outcome.state) {
                return Ok(());
            }
            let mut action = self.action.clone().with_env([
                ("RUNDAG_TARGET", outcome.name.clone()),
                ("RUNDAG_STATE", outcome.state.to_string()),
            ]);
            action.run().await
        })
    }
}
