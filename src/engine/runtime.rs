// src/engine/runtime.rs

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::dag::{ExecutionPlan, TargetDef, TargetGraph};
use crate::engine::hooks::OutcomeHook;
use crate::engine::report::RunReport;
use crate::engine::{CoreRun, CoreStep, HookFailure, TargetFailure, TargetOutcome};
use crate::errors::{Result, RundagError};
use crate::exec::Action;
use crate::outputs::{OutputCollector, OutputPatterns};
use crate::types::{TargetName, TargetState};

/// Target registry plus the async shell that runs plans against it.
///
/// Runs are strictly sequential: one action is awaited at a time, in plan
/// order. All per-run state lives in a [`CoreRun`]; the executor only owns
/// the static registry, so the same executor can run several plans.
///
/// An action that never returns blocks the run; there is no timeout.
pub struct Executor {
    graph: TargetGraph,
    actions: HashMap<TargetName, Box<dyn Action>>,
    hooks: HashMap<TargetName, Vec<Box<dyn OutcomeHook>>>,
    outputs: HashMap<TargetName, OutputPatterns>,
    collector: Option<OutputCollector>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("graph", &self.graph)
            .field("collector", &self.collector)
            .finish_non_exhaustive()
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self {
            graph: TargetGraph::new(),
            actions: HashMap::new(),
            hooks: HashMap::new(),
            outputs: HashMap::new(),
            collector: None,
        }
    }

    /// Where `produces` patterns are resolved. Without a collector, declared
    /// outputs are ignored.
    pub fn with_output_collector(mut self, collector: OutputCollector) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Register a target with its dependencies and action.
    pub fn register<I, S, A>(&mut self, name: &str, deps: I, action: A) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<TargetName>,
        A: Action + 'static,
    {
        self.register_target(TargetDef::new(name).with_deps(deps), action)
    }

    /// Register a fully described target (dependencies, ordering, description).
    pub fn register_target<A>(&mut self, def: TargetDef, action: A) -> Result<()>
    where
        A: Action + 'static,
    {
        let name = def.name.clone();
        self.graph.add(def)?;
        self.actions.insert(name, Box::new(action));
        Ok(())
    }

    /// Attach a hook to a registered target.
    pub fn add_hook<H>(&mut self, target: &str, hook: H) -> Result<()>
    where
        H: OutcomeHook + 'static,
    {
        if !self.graph.contains(target) {
            return Err(RundagError::UnknownTarget(target.to_string()));
        }
        self.hooks
            .entry(target.to_string())
            .or_default()
            .push(Box::new(hook));
        Ok(())
    }

    /// Declare the files a registered target produces.
    pub fn set_produces(&mut self, target: &str, patterns: OutputPatterns) -> Result<()> {
        if !self.graph.contains(target) {
            return Err(RundagError::UnknownTarget(target.to_string()));
        }
        self.outputs.insert(target.to_string(), patterns);
        Ok(())
    }

    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    /// Description of a target's action, if it has one.
    pub fn describe_action(&self, target: &str) -> Option<String> {
        self.actions.get(target).map(|a| a.describe())
    }

    pub fn plan(&self, root: &str) -> Result<ExecutionPlan> {
        self.graph.plan(root)
    }

    pub fn plan_many<S: AsRef<str>>(&self, roots: &[S]) -> Result<ExecutionPlan> {
        self.graph.plan_many(roots)
    }

    /// Execute `plan`.
    ///
    /// Construction problems (a plan that does not match this registry) are
    /// returned as errors before any action runs. Action failures are not
    /// errors: they are captured in the returned [`RunReport`].
    pub async fn run(&mut self, plan: &ExecutionPlan) -> Result<RunReport> {
        let mut core = CoreRun::new(&self.graph, plan)?;
        let mut report = RunReport::default();

        info!(targets = plan.len(), plan = %plan, "starting run");

        loop {
            match core.next_step() {
                CoreStep::Finished => break,
                CoreStep::Busy(name) => {
                    return Err(RundagError::InvalidPlan(format!(
                        "target '{name}' never reported completion"
                    )));
                }
                CoreStep::Skip { target, blocked_by } => {
                    warn!(
                        target_name = %target,
                        blocked_by = %blocked_by,
                        "skipping target because a dependency did not succeed"
                    );
                    let outcome = TargetOutcome::skipped(target, blocked_by);
                    fire_hooks(&mut self.hooks, &outcome, &mut report).await;
                    report.outcomes.push(outcome);
                }
                CoreStep::Execute(name) => {
                    info!(target_name = %name, "running target");

                    let started = Instant::now();
                    let result = match self.actions.get_mut(&name) {
                        Some(action) => action.run().await,
                        None => Ok(()),
                    };
                    let elapsed = started.elapsed();

                    let Some(state) = core.complete(&name, result.is_ok()) else {
                        return Err(RundagError::InvalidPlan(format!(
                            "target '{name}' finished while another target was running"
                        )));
                    };
                    let mut outcome = TargetOutcome::finished(name.clone(), state, elapsed);

                    match result {
                        Ok(()) => {
                            info!(target_name = %name, elapsed = ?elapsed, "target succeeded");
                            outcome.outputs = self.collect_outputs(&name);
                        }
                        Err(err) => {
                            let message = format!("{err:#}");
                            error!(target_name = %name, error = %message, elapsed = ?elapsed, "target failed");
                            outcome.error = Some(message);
                            report.failures.push(TargetFailure {
                                target: name.clone(),
                                error: err,
                            });
                        }
                    }

                    fire_hooks(&mut self.hooks, &outcome, &mut report).await;
                    report.outcomes.push(outcome);
                }
            }
        }

        info!(
            succeeded = report.succeeded().len(),
            failed = report.failed().len(),
            skipped = report.skipped().len(),
            "run finished"
        );
        Ok(report)
    }

    fn collect_outputs(&self, target: &str) -> Vec<std::path::PathBuf> {
        let (Some(collector), Some(patterns)) = (&self.collector, self.outputs.get(target)) else {
            return Vec::new();
        };
        match collector.collect(patterns) {
            Ok(files) => {
                if files.is_empty() {
                    warn!(
                        target_name = %target,
                        root = %collector.root().display(),
                        patterns = ?patterns.patterns(),
                        "target declares outputs but none were found"
                    );
                }
                files
            }
            Err(e) => {
                warn!(target_name = %target, error = %e, "failed to collect target outputs");
                Vec::new()
            }
        }
    }
}

async fn fire_hooks(
    hooks: &mut HashMap<TargetName, Vec<Box<dyn OutcomeHook>>>,
    outcome: &TargetOutcome,
    report: &mut RunReport,
) {
    let Some(hooks) = hooks.get_mut(&outcome.name) else {
        return;
    };
    debug_assert!(outcome.state != TargetState::Running);

    for hook in hooks.iter_mut() {
        if let Err(err) = hook.on_outcome(outcome).await {
            let message = format!("{err:#}");
            warn!(
                target_name = %outcome.name,
                state = %outcome.state,
                error = %message,
                "outcome hook failed"
            );
            report.hook_failures.push(HookFailure {
                target: outcome.name.clone(),
                error: err,
            });
        } else {
            debug!(target_name = %outcome.name, state = %outcome.state, "outcome hook ran");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::engine::FnHook;
    use crate::exec::FnAction;

    fn recording(log: &Arc<Mutex<Vec<String>>>, name: &str, ok: bool) -> impl Action + 'static {
        let log = Arc::clone(log);
        let name = name.to_string();
        FnAction::new(move || {
            log.lock().unwrap().push(name.clone());
            if ok { Ok(()) } else { anyhow::bail!("{name} failed") }
        })
    }

    #[tokio::test]
    async fn hooks_see_final_outcomes() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut exec = Executor::new();
        exec.register("Compile", Vec::<String>::new(), recording(&log, "Compile", false))
            .unwrap();
        exec.register("Test", ["Compile"], recording(&log, "Test", true))
            .unwrap();
        for target in ["Compile", "Test"] {
            let seen = Arc::clone(&seen);
            exec.add_hook(
                target,
                FnHook::new(move |o: &TargetOutcome| {
                    seen.lock().unwrap().push((o.name.clone(), o.state));
                    Ok(())
                }),
            )
            .unwrap();
        }

        let plan = exec.plan("Test").unwrap();
        let report = exec.run(&plan).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["Compile".to_string()]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("Compile".to_string(), TargetState::Failed),
                ("Test".to_string(), TargetState::Skipped),
            ]
        );
        assert_eq!(report.failures[0].target, "Compile");
        assert_eq!(report.failures[0].error.to_string(), "Compile failed");
    }

    #[tokio::test]
    async fn failing_hook_does_not_fail_the_run() {
        let mut exec = Executor::new();
        exec.register("Test", Vec::<String>::new(), FnAction::new(|| Ok(())))
            .unwrap();
        exec.add_hook("Test", FnHook::new(|_: &TargetOutcome| anyhow::bail!("publish failed")))
            .unwrap();

        let plan = exec.plan("Test").unwrap();
        let report = exec.run(&plan).await.unwrap();

        assert!(report.success());
        assert_eq!(report.state_of("Test"), Some(TargetState::Succeeded));
        assert_eq!(report.hook_failures.len(), 1);
    }

    #[test]
    fn hooks_and_outputs_need_a_registered_target() {
        let mut exec = Executor::new();
        let hook = FnHook::new(|_: &TargetOutcome| Ok(()));
        assert!(matches!(
            exec.add_hook("Test", hook),
            Err(RundagError::UnknownTarget(_))
        ));
        let patterns = OutputPatterns::new(&["out/*".to_string()]).unwrap();
        assert!(matches!(
            exec.set_produces("Test", patterns),
            Err(RundagError::UnknownTarget(_))
        ));
    }

    #[tokio::test]
    async fn executor_can_run_several_plans() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut exec = Executor::new();
        exec.register("Restore", Vec::<String>::new(), recording(&log, "Restore", true))
            .unwrap();

        let plan = exec.plan("Restore").unwrap();
        assert!(exec.run(&plan).await.unwrap().success());
        assert!(exec.run(&plan).await.unwrap().success());
        assert_eq!(log.lock().unwrap().len(), 2);
    }
}
