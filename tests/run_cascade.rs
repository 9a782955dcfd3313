// tests/run_cascade.rs

mod common;
use crate::common::{RunLog, build_script, init_tracing, script_with_failing, with_timeout};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rundag::engine::{Executor, FnHook, TargetOutcome};
use rundag::fs::mock::MockFileSystem;
use rundag::outputs::{OutputCollector, OutputPatterns};
use rundag::types::TargetState;

#[tokio::test]
async fn all_targets_succeed_in_plan_order() {
    init_tracing();
    let log = RunLog::new();
    let mut exec = build_script(&log);

    let plan = exec.plan_many(&["Test", "Clean"]).unwrap();
    let report = with_timeout(exec.run(&plan)).await.unwrap();

    assert!(report.success());
    assert_eq!(log.entries(), vec!["Clean", "Restore", "Compile", "Test"]);
    assert_eq!(report.succeeded().len(), 4);
    assert!(report.outcomes.iter().all(|o| o.duration.is_some()));
}

#[tokio::test]
async fn restore_failure_skips_everything_downstream() {
    init_tracing();
    let log = RunLog::new();
    let mut exec = script_with_failing(&log, &["Restore"]);

    let plan = exec.plan("Test").unwrap();
    let report = with_timeout(exec.run(&plan)).await.unwrap();

    assert!(!report.success());
    assert_eq!(log.entries(), vec!["Restore"]);
    assert_eq!(report.state_of("Restore"), Some(TargetState::Failed));
    assert_eq!(report.state_of("Compile"), Some(TargetState::Skipped));
    assert_eq!(report.state_of("Test"), Some(TargetState::Skipped));

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target, "Restore");
    assert_eq!(report.failures[0].error.to_string(), "Restore failed");

    let test = report.outcome("Test").unwrap();
    assert_eq!(test.blocked_by.as_deref(), Some("Compile"));
    assert_eq!(test.duration, None);
}

#[tokio::test]
async fn failed_ordering_target_does_not_skip_what_it_orders() {
    init_tracing();
    let log = RunLog::new();
    let mut exec = script_with_failing(&log, &["Clean"]);

    let plan = exec.plan_many(&["Test", "Clean"]).unwrap();
    let report = with_timeout(exec.run(&plan)).await.unwrap();

    assert_eq!(log.entries(), vec!["Clean", "Restore", "Compile", "Test"]);
    assert_eq!(report.failed(), vec!["Clean".to_string()]);
    assert_eq!(
        report.succeeded(),
        vec!["Restore".to_string(), "Compile".to_string(), "Test".to_string()]
    );
    assert!(report.skipped().is_empty());
    assert!(!report.success());
}

#[tokio::test]
async fn independent_branch_runs_after_a_failure() {
    init_tracing();
    let log = RunLog::new();
    let mut exec = Executor::new();
    exec.register("Lint", Vec::<String>::new(), log.ok("Lint"))
        .unwrap();
    exec.register(
        "Restore",
        Vec::<String>::new(),
        log.failing("Restore", "feed unreachable"),
    )
    .unwrap();
    exec.register("Package", ["Lint", "Restore"], log.ok("Package"))
        .unwrap();

    let plan = exec.plan("Package").unwrap();
    let report = with_timeout(exec.run(&plan)).await.unwrap();

    assert_eq!(log.entries(), vec!["Lint", "Restore"]);
    assert_eq!(report.succeeded(), vec!["Lint".to_string()]);
    assert_eq!(report.failed(), vec!["Restore".to_string()]);
    assert_eq!(report.skipped(), vec!["Package".to_string()]);
    assert!(!report.success());
    assert!(report.to_string().ends_with("Build failed: Restore"));
}

#[tokio::test]
async fn hooks_observe_every_final_outcome() {
    init_tracing();
    let log = RunLog::new();
    let mut exec = script_with_failing(&log, &["Compile"]);

    let seen: Arc<Mutex<Vec<(String, TargetState)>>> = Arc::default();
    for target in ["Restore", "Compile", "Test"] {
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
    let report = with_timeout(exec.run(&plan)).await.unwrap();

    assert!(!report.success());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("Restore".to_string(), TargetState::Succeeded),
            ("Compile".to_string(), TargetState::Failed),
            ("Test".to_string(), TargetState::Skipped),
        ]
    );
    assert!(report.hook_failures.is_empty());
}

#[tokio::test]
async fn produced_outputs_are_recorded_on_success() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("./output/test-results/unit.trx", "<TestRun/>");
    fs.add_file("./output/app.dll", "mz");

    let log = RunLog::new();
    let mut exec = build_script(&log).with_output_collector(OutputCollector::new(Arc::new(fs), "."));
    exec.set_produces(
        "Test",
        OutputPatterns::new(&["output/test-results/*.trx".to_string()]).unwrap(),
    )
    .unwrap();

    let plan = exec.plan("Test").unwrap();
    let report = with_timeout(exec.run(&plan)).await.unwrap();

    assert_eq!(
        report.outcome("Test").unwrap().outputs,
        vec![PathBuf::from("./output/test-results/unit.trx")]
    );
    assert!(report.outcome("Compile").unwrap().outputs.is_empty());
}

#[tokio::test]
async fn plan_from_another_registry_is_rejected_before_running() {
    let other_log = RunLog::new();
    let other = build_script(&other_log);
    let plan = other.plan("Test").unwrap();

    let log = RunLog::new();
    let mut exec = Executor::new();
    exec.register("Test", Vec::<String>::new(), log.ok("Test"))
        .unwrap();

    assert!(exec.run(&plan).await.is_err());
    assert!(log.entries().is_empty());
}
