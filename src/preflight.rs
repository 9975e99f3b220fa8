//! Pre-flight checks
//!
//! Everything here runs once, before the plan file is even read, and fails
//! fast on the first problem found.

use crate::error::{PrerequisiteError, PrerequisiteResult};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Naming convention for new JRE directories
pub const TARGET_NAME_PATTERN: &str = r"\Sjre.\S";

/// What must be true of the host before a build starts
#[derive(Debug, Clone, PartialEq)]
pub struct Prerequisites {
    /// Variable holding the toolchain root
    pub toolchain_var: String,

    /// Executables relative to the toolchain root
    pub tools: Vec<PathBuf>,

    /// Directories that must exist, with the name used in error messages
    pub directories: Vec<(String, PathBuf)>,

    /// Target name and the pattern it must match
    pub target_name: Option<(String, String)>,
}

impl Prerequisites {
    pub fn new(toolchain_var: impl Into<String>) -> Self {
        Prerequisites {
            toolchain_var: toolchain_var.into(),
            tools: Vec::new(),
            directories: Vec::new(),
            target_name: None,
        }
    }

    /// The checks a JRE build needs: `jlink` and `java` under `JAVA_HOME`,
    /// the jmods directory, `<hsqldb_root>/lib`, and a conforming target name
    pub fn for_jre_build(jmods_dir: &Path, hsqldb_root: &Path, target_name: &str) -> Self {
        Prerequisites::new(crate::runner::JAVA_HOME)
            .with_tool("bin/jlink")
            .with_tool("bin/java")
            .with_directory("Source JRE jmods directory", jmods_dir)
            .with_directory("HyperSQL lib directory", hsqldb_root.join("lib"))
            .with_target_name(target_name, TARGET_NAME_PATTERN)
    }

    pub fn with_tool(mut self, relative: impl Into<PathBuf>) -> Self {
        self.tools.push(relative.into());
        self
    }

    pub fn with_directory(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.directories.push((name.into(), path.into()));
        self
    }

    pub fn with_target_name(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.target_name = Some((name.into(), pattern.into()));
        self
    }

    /// Run every check against `env`, returning the toolchain root
    pub fn check(&self, env: &HashMap<String, String>) -> PrerequisiteResult<PathBuf> {
        let root = env
            .get(&self.toolchain_var)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| PrerequisiteError::MissingVariable(self.toolchain_var.clone()))?;

        for tool in &self.tools {
            check_executable(&root.join(tool))?;
        }

        for (name, path) in &self.directories {
            if !path.is_dir() {
                return Err(PrerequisiteError::DirectoryMissing {
                    name: name.clone(),
                    path: path.clone(),
                });
            }
        }

        if let Some((name, pattern)) = &self.target_name {
            check_target_name(name, pattern)?;
        }

        Ok(root)
    }
}

fn check_executable(path: &Path) -> PrerequisiteResult<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !path.is_file() {
        return Err(PrerequisiteError::ToolMissing {
            name,
            path: path.to_path_buf(),
        });
    }

    if !is_executable(path) {
        return Err(PrerequisiteError::ToolNotExecutable {
            name,
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn check_target_name(name: &str, pattern: &str) -> PrerequisiteResult<()> {
    let re = Regex::new(pattern).map_err(|e| PrerequisiteError::BadPattern {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })?;

    if re.is_match(name) {
        Ok(())
    } else {
        Err(PrerequisiteError::BadTargetName {
            name: name.to_string(),
            pattern: pattern.to_string(),
        })
    }
}

/// Make sure `target` can be created
///
/// An existing target is removed when `force` is set; otherwise its presence
/// is an error.
pub fn prepare_output(target: &Path, force: bool) -> PrerequisiteResult<()> {
    if force && target.exists() {
        let removed = if target.is_dir() {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };
        removed.map_err(|e| PrerequisiteError::RemoveFailed {
            path: target.to_path_buf(),
            error: e.to_string(),
        })?;
    }

    if target.exists() {
        return Err(PrerequisiteError::OutputExists(target.to_path_buf()));
    }

    Ok(())
}
