//! Integration tests for running plans against real processes

mod common;

use jrebuild::error::{AbortReason, RunnerError};
use jrebuild::plan::{parse_plan, PlanFormat, INLINE_SOURCE};
use jrebuild::runner::{ExecutionContext, Executor, StepStatus, StreamDefaults};
use jrebuild::ui::{Logger, Verbosity};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn quiet_executor() -> Executor {
    Executor::system(Logger::new(Verbosity::Quiet)).with_stream_defaults(StreamDefaults {
        show_stdout: false,
        show_stderr: false,
    })
}

fn context(dir: &TempDir) -> ExecutionContext {
    ExecutionContext::new()
        .with_base_dir(dir.path().to_path_buf())
        .with_var("TARGET_JRE_NAME", "myjre.1")
        .with_var("THIS_PLATFORM", "linux")
}

#[test]
fn test_plan_aborts_on_failing_step() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[
        {"cmd": ["echo", "a"], "require0": true},
        {"cmd": ["false"], "require0": true},
        {"cmd": ["echo", "b"]}
    ]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let err = quiet_executor().run(&plan, &context(&temp_dir)).unwrap_err();
    assert_eq!(err.index, 1);
    assert_eq!(err.exit_code(), Some(1));
    assert_eq!(err.report.outcomes.len(), 2);
    assert_eq!(err.report.outcomes[0].stdout, "a\n");
    assert_eq!(err.report.aborted_at(), Some(1));
}

#[test]
fn test_tolerated_failure_records_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[
        {"cmd": ["echo", "a"]},
        {"cmd": ["sh", "-c", "echo warn >&2; exit 4"], "require0": false},
        {"cmd": ["echo", "b"]}
    ]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let report = quiet_executor().run(&plan, &context(&temp_dir)).unwrap();
    assert!(report.is_completed());
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[1].exit_code, Some(4));
    assert_eq!(report.outcomes[1].status, StepStatus::Failed);
    assert_eq!(report.outcomes[1].stderr, "warn\n");
    assert_eq!(report.outcomes[2].stdout, "b\n");
}

#[test]
fn test_steps_share_filesystem_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[
        {"cmd": ["mkdir", "${TARGET_JRE_NAME}"]},
        {"cmd": ["sh", "-c", "echo linked > release"], "cwd": "${TARGET_JRE_NAME}"},
        {"cmd": ["cat", "${TARGET_JRE_NAME}/release"], "condition": "is_dir('${TARGET_JRE_NAME}')"}
    ]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let report = quiet_executor().run(&plan, &context(&temp_dir)).unwrap();
    assert_eq!(report.skipped_count(), 0);
    assert_eq!(report.outcomes[2].stdout, "linked\n");
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("myjre.1/release")).unwrap(),
        "linked\n"
    );
}

#[test]
fn test_platform_condition_skips() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[
        {"label": "mac only", "cmd": ["touch", "mac.txt"], "condition": "THIS_PLATFORM == \"darwin\""},
        {"label": "linux only", "cmd": ["touch", "linux.txt"], "condition": "THIS_PLATFORM == \"linux\""}
    ]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let report = quiet_executor().run(&plan, &context(&temp_dir)).unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].label, "mac only");
    assert_eq!(report.outcomes.len(), 1);
    assert!(!temp_dir.path().join("mac.txt").exists());
    assert!(temp_dir.path().join("linux.txt").exists());
}

#[test]
fn test_missing_program_aborts_regardless_of_policy() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[
        {"cmd": ["jrebuild-test-no-such-program"], "require0": false},
        {"cmd": ["touch", "never.txt"]}
    ]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let err = quiet_executor().run(&plan, &context(&temp_dir)).unwrap_err();
    assert!(matches!(
        err.reason,
        AbortReason::Runner(RunnerError::NotFound { .. })
    ));
    assert!(err.report.outcomes.is_empty());
    assert!(!temp_dir.path().join("never.txt").exists());
}

#[test]
fn test_missing_working_dir_aborts() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[{"cmd": ["ls"], "cwd": "not-created-yet"}]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let err = quiet_executor().run(&plan, &context(&temp_dir)).unwrap_err();
    assert!(matches!(
        err.reason,
        AbortReason::Runner(RunnerError::WorkingDirectoryMissing(_))
    ));
}

#[test]
fn test_context_variables_reach_child_environment() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[{"cmd": ["sh", "-c", "echo $TARGET_JRE_NAME"]}]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let report = quiet_executor().run(&plan, &context(&temp_dir)).unwrap();
    assert_eq!(report.outcomes[0].stdout, "myjre.1\n");
}

#[test]
fn test_failure_message_has_stderr_tail() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[{"label": "link", "cmd": ["sh", "-c", "echo 'Error: module not found: java.bogus' >&2; exit 1"]}]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let err = quiet_executor().run(&plan, &context(&temp_dir)).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("step 0 (link)"));
    assert!(message.contains("exited with code 1"));
    assert!(message.contains("module not found: java.bogus"));
}

#[test]
fn test_elapsed_times_are_bounded_by_wall_clock() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[
        {"cmd": ["sleep", "0.05"]},
        {"cmd": ["sleep", "0.05"]}
    ]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let before = Instant::now();
    let report = quiet_executor().run(&plan, &context(&temp_dir)).unwrap();
    let wall_clock = before.elapsed();

    assert!(report.elapsed <= wall_clock);
    assert!(report.elapsed >= Duration::from_millis(100));

    let step_total: Duration = report.outcomes.iter().map(|o| o.elapsed).sum();
    assert!(step_total <= report.elapsed);
    assert!(report.outcomes.iter().all(|o| o.elapsed >= Duration::from_millis(50)));
}

#[test]
fn test_elapsed_recorded_on_abort() {
    let temp_dir = TempDir::new().unwrap();
    let json = r#"[
        {"cmd": ["sleep", "0.05"]},
        {"cmd": ["false"]}
    ]"#;
    let plan = parse_plan(json, PlanFormat::Json, INLINE_SOURCE).unwrap();

    let before = Instant::now();
    let err = quiet_executor().run(&plan, &context(&temp_dir)).unwrap_err();
    let wall_clock = before.elapsed();

    assert!(err.report.elapsed <= wall_clock);
    assert!(err.report.elapsed >= err.report.outcomes[0].elapsed);
}
