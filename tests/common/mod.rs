//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary directory with a plan file
pub fn create_test_plan(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let plan_path = temp_dir.path().join(name);
    fs::write(&plan_path, content).unwrap();
    (temp_dir, plan_path)
}

/// Lay out a fake JDK (executable `bin/jlink` and `bin/java`), a jmods
/// directory and a HyperSQL root with `lib/` under `dir`
pub fn create_build_layout(dir: &Path) -> BuildLayout {
    let java_home = dir.join("jdk");
    fs::create_dir_all(java_home.join("bin")).unwrap();
    for tool in ["jlink", "java"] {
        let path = java_home.join("bin").join(tool);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        make_executable(&path);
    }

    let jmods_dir = java_home.join("jmods");
    fs::create_dir_all(&jmods_dir).unwrap();

    let hsqldb_root = dir.join("hsqldb");
    fs::create_dir_all(hsqldb_root.join("lib")).unwrap();

    BuildLayout {
        java_home,
        jmods_dir,
        hsqldb_root,
    }
}

pub struct BuildLayout {
    pub java_home: PathBuf,
    pub jmods_dir: PathBuf,
    pub hsqldb_root: PathBuf,
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
