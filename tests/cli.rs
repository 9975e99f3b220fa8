//! Binary-level tests for the jrebuild command

mod common;

use assert_cmd::Command;
use common::{create_build_layout, BuildLayout};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const JRE_NAME: &str = "testjre.1";

fn jrebuild(dir: &Path, layout: &BuildLayout) -> Command {
    let mut cmd = Command::cargo_bin("jrebuild").unwrap();
    cmd.current_dir(dir).env("JAVA_HOME", &layout.java_home);
    cmd
}

fn write_plan(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("cmd.json");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_successful_build() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(
        temp_dir.path(),
        r#"[
            {"label": "create", "cmd": ["mkdir", "${TARGET_JRE_NAME}"]},
            {"label": "show", "cmd": ["echo", "building ${TARGET_JRE_NAME}"]}
        ]"#,
    );

    jrebuild(temp_dir.path(), &layout)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains("building testjre.1"))
        .stderr(predicate::str::contains("took"));

    assert!(temp_dir.path().join(JRE_NAME).is_dir());
}

#[test]
fn test_hide_stdout_flag() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(
        temp_dir.path(),
        r#"[
            {"cmd": ["echo", "hidden-by-default"]},
            {"cmd": ["echo", "shown-explicitly"], "stdOut": true}
        ]"#,
    );

    jrebuild(temp_dir.path(), &layout)
        .arg("-O")
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains("hidden-by-default").not())
        .stdout(predicate::str::contains("shown-explicitly"));
}

#[test]
fn test_step_hides_its_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(
        temp_dir.path(),
        r#"[{"cmd": ["echo", "private-output"], "stdOut": false}]"#,
    );

    jrebuild(temp_dir.path(), &layout)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains("private-output").not());
}

#[test]
fn test_failing_step_exits_non_zero() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(
        temp_dir.path(),
        r#"[
            {"cmd": ["echo", "a"]},
            {"label": "breaks", "cmd": ["false"]},
            {"cmd": ["touch", "never.txt"]}
        ]"#,
    );

    jrebuild(temp_dir.path(), &layout)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Plan aborted at step 1 (breaks)"))
        .stderr(predicate::str::contains("exited with code 1"));

    assert!(!temp_dir.path().join("never.txt").exists());
}

#[test]
fn test_missing_java_home() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(temp_dir.path(), r#"[{"cmd": ["touch", "ran.txt"]}]"#);

    Command::cargo_bin("jrebuild")
        .unwrap()
        .current_dir(temp_dir.path())
        .env_remove("JAVA_HOME")
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("You must set env var JAVA_HOME"));

    assert!(!temp_dir.path().join("ran.txt").exists());
}

#[test]
fn test_bad_target_name() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(temp_dir.path(), r#"[{"cmd": ["true"]}]"#);

    jrebuild(temp_dir.path(), &layout)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg("runtime")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not of form"));
}

#[test]
fn test_existing_target_requires_rebuild() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(
        temp_dir.path(),
        r#"[{"cmd": ["mkdir", "${TARGET_JRE_NAME}"]}]"#,
    );
    fs::create_dir(temp_dir.path().join(JRE_NAME)).unwrap();
    fs::write(temp_dir.path().join(JRE_NAME).join("stale"), "").unwrap();

    jrebuild(temp_dir.path(), &layout)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Try -r switch"));

    jrebuild(temp_dir.path(), &layout)
        .arg("-r")
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .success();

    assert!(temp_dir.path().join(JRE_NAME).is_dir());
    assert!(!temp_dir.path().join(JRE_NAME).join("stale").exists());
}

#[test]
fn test_invalid_plan_file() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(temp_dir.path(), r#"{"cmd": ["true"]}"#);

    jrebuild(temp_dir.path(), &layout)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("plan must be a list"));
}

#[test]
fn test_completions() {
    Command::cargo_bin("jrebuild")
        .unwrap()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jrebuild"));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_environment_variable() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(temp_dir.path(), r#"[{"cmd": ["touch", "ran.txt"]}]"#);
    let garbled = OsStr::from_bytes(&[0x66, 0xff, 0x6f]);

    Command::cargo_bin("jrebuild")
        .unwrap()
        .current_dir(temp_dir.path())
        .env_remove("JAVA_HOME")
        .env("JREBUILD_GARBLED", garbled)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("You must set env var JAVA_HOME"));

    jrebuild(temp_dir.path(), &layout)
        .env("JREBUILD_GARBLED", garbled)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .assert()
        .success();

    assert!(temp_dir.path().join("ran.txt").exists());
}

#[test]
fn test_interactive_step_reads_stdin() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(
        temp_dir.path(),
        r#"[{"cmd": ["cat"], "interactive": true}]"#,
    );

    jrebuild(temp_dir.path(), &layout)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .write_stdin("typed\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("typed"));
}

#[test]
fn test_non_interactive_step_gets_no_stdin() {
    let temp_dir = TempDir::new().unwrap();
    let layout = create_build_layout(temp_dir.path());
    let plan = write_plan(temp_dir.path(), r#"[{"cmd": ["cat"]}]"#);

    jrebuild(temp_dir.path(), &layout)
        .arg(&layout.jmods_dir)
        .arg(&layout.hsqldb_root)
        .arg(JRE_NAME)
        .arg(&plan)
        .write_stdin("typed\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("typed").not());
}
