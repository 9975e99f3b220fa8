//! Execution context for plan runs
//!
//! The context holds the fixed set of named values available to steps and
//! conditions. It is built once before the plan starts and never mutated by steps.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

/// Variable holding the toolchain root
pub const JAVA_HOME: &str = "JAVA_HOME";
/// Variable holding the supplementary library root
pub const HSQLDB_ROOT: &str = "HSQLDB_ROOT";
/// Variable holding the output target name
pub const TARGET_JRE_NAME: &str = "TARGET_JRE_NAME";
/// Variable holding the source module directory
pub const SRC_JRE_JMODS: &str = "SRC_JRE_JMODS";
/// Variable holding the host platform identifier
pub const THIS_PLATFORM: &str = "THIS_PLATFORM";

/// Immutable variables plus the base directory relative paths resolve against
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    vars: BTreeMap<String, String>,
    base_dir: PathBuf,
}

impl ExecutionContext {
    /// Create an empty context rooted at the current directory
    pub fn new() -> Self {
        ExecutionContext {
            vars: BTreeMap::new(),
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Set the base directory
    pub fn with_base_dir(mut self, dir: PathBuf) -> Self {
        self.base_dir = dir;
        self
    }

    /// Add one variable
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Add several variables
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Get a variable value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a path against the base directory
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Existence predicate offered to conditions
    pub fn path_exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    /// Regular-file predicate offered to conditions
    pub fn path_is_file(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    /// Directory predicate offered to conditions
    pub fn path_is_dir(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Conventional name of the host platform (`linux`, `darwin`, `win32`, ...)
pub fn host_platform() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}
