#![allow(dead_code)]

pub use rundag_test_utils::builders;
pub use rundag_test_utils::fake_action::{FakeAction, RunLog};
pub use rundag_test_utils::{init_tracing, with_timeout};

use rundag::engine::Executor;

/// The reference build script: Clean, Restore, Compile(Restore), Test(Compile),
/// with Clean ordered before Restore.
pub fn build_script(log: &RunLog) -> Executor {
    script_with_failing(log, &[])
}

/// Same as [`build_script`], with the named targets failing.
pub fn script_with_failing(log: &RunLog, failing: &[&str]) -> Executor {
    let action = |name: &str| {
        if failing.contains(&name) {
            log.failing(name, &format!("{name} failed"))
        } else {
            log.ok(name)
        }
    };

    let mut exec = Executor::new();
    exec.register_target(
        rundag::dag::TargetDef::new("Clean").with_before(["Restore"]),
        action("Clean"),
    )
    .unwrap();
    exec.register("Restore", Vec::<String>::new(), action("Restore"))
        .unwrap();
    exec.register("Compile", ["Restore"], action("Compile"))
        .unwrap();
    exec.register("Test", ["Compile"], action("Test")).unwrap();
    exec
}
